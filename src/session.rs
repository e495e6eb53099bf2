//! Password hashing and the signed cookie session.
//!
//! The session cookie holds only the user id; everything else is loaded per
//! request by `ClientCtx`.

use crate::user::Profile;
use actix_session::Session;
use actix_web::{error, Error};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use once_cell::sync::Lazy;
use sea_orm::ConnectionTrait;

const SESSION_USER_KEY: &str = "user_id";

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

/// Shared argon2id instance.
pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a password into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for mismatches and for unparseable stored hashes.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is not a PHC string: {}", e);
            false
        }
    }
}

/// Returns the logged in user's id, if any.
pub fn get_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(SESSION_USER_KEY) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("get_user_id: malformed session value: {}", e);
            None
        }
    }
}

/// Binds `user_id` to a freshly renewed session.
pub fn start_session(session: &Session, user_id: i32) -> Result<(), Error> {
    session.renew();
    session
        .insert(SESSION_USER_KEY, user_id)
        .map_err(|_| error::ErrorInternalServerError("Failed to store session"))
}

/// Drops every session value, including the CSRF token.
pub fn end_session(session: &Session) {
    session.purge();
}

/// Loads the profile for the session's user. A session pointing at a
/// deleted account is treated as a guest.
pub async fn authenticate_client_by_session<C: ConnectionTrait>(
    db: &C,
    session: &Session,
) -> Option<Profile> {
    let user_id = get_user_id(session)?;

    match Profile::get_by_id(db, user_id).await {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => {
            log::debug!("authenticate_client_by_session: user {} no longer exists", user_id);
            session.remove(SESSION_USER_KEY);
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}
