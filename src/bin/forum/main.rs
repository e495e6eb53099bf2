use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::{App, HttpServer};
use env_logger::Env;
use liteforum::db::init_db;
use liteforum::middleware::ClientCtx;
use rand::{distributions::Alphanumeric, Rng};

/// Minimum accepted `SECRET_KEY` length, in bytes.
const MIN_SECRET_KEY_LEN: usize = 64;

/// Cookie signing key from `SECRET_KEY`. Falls back to a random key, which
/// logs every user out on restart.
fn session_key() -> Key {
    match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= MIN_SECRET_KEY_LEN => Key::from(key.as_bytes()),
        Ok(_) => {
            log::warn!(
                "SECRET_KEY is shorter than {} bytes; using a random key for this run.",
                MIN_SECRET_KEY_LEN
            );
            random_key()
        }
        Err(_) => {
            log::warn!("SECRET_KEY is not set; using a random key for this run.");
            random_key()
        }
    }
}

fn random_key() -> Key {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MIN_SECRET_KEY_LEN * 2)
        .map(char::from)
        .collect();
    Key::from(secret.as_bytes())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    liteforum::app_config::init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| liteforum::app_config::database().url);
    init_db(database_url).await;

    let secret_key = session_key();

    let cookie_secure = liteforum::app_config::security().cookie_secure;
    let bind = liteforum::app_config::server().bind;
    log::info!("Listening on {}", bind);

    HttpServer::new(move || {
        // Last wrap runs first: Logger, session, ClientCtx, error pages, headers.
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, liteforum::web::error::render_400)
                    .handler(StatusCode::UNAUTHORIZED, liteforum::web::error::render_401)
                    .handler(StatusCode::FORBIDDEN, liteforum::web::error::render_403)
                    .handler(StatusCode::NOT_FOUND, liteforum::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        liteforum::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(cookie_secure)
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(liteforum::web::configure)
    })
    .bind(bind)?
    .run()
    .await
}
