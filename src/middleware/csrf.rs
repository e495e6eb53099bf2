//! CSRF protection for form posts.
//!
//! One token per session, stored in the signed session cookie. Every form
//! that changes state carries it in a hidden `csrf_token` field:
//!
//! ```html,ignore
//! <input type="hidden" name="csrf_token" value="{{ client.get_csrf_token() }}">
//! ```
//!
//! and its handler checks it before touching the database:
//!
//! ```rust,ignore
//! validate_csrf_token(&session, &form.csrf_token)?;
//! ```

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns the session's token, creating one on first use.
/// Called by `ClientCtx` on every request.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(CSRF_SESSION_KEY) {
        return Ok(token);
    }

    let token = generate_csrf_token();
    session
        .insert(CSRF_SESSION_KEY, token.clone())
        .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
    Ok(token)
}

/// Forbidden unless `provided_token` matches the session's token.
pub fn validate_csrf_token(session: &Session, provided_token: &str) -> Result<(), Error> {
    let expected_token = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to get CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if provided_token.is_empty() || provided_token != expected_token {
        log::warn!("validate_csrf_token: token mismatch");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }

    Ok(())
}
