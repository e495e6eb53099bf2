//! CSRF protection on state-changing routes

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, http::StatusCode, test, App};

fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_secure(false)
        .build()
}

#[actix_rt::test]
async fn test_login_without_token_is_forbidden() {
    let app = test::init_service(
        App::new()
            .wrap(session_middleware())
            .service(liteforum::web::login::post_login),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form(&[("username", "alice"), ("password", "password123"), ("csrf_token", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(StatusCode::FORBIDDEN, resp.status());
}

#[actix_rt::test]
async fn test_login_with_forged_token_is_forbidden() {
    let app = test::init_service(
        App::new()
            .wrap(session_middleware())
            .service(liteforum::web::login::post_login),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form(&[
            ("username", "alice"),
            ("password", "password123"),
            ("csrf_token", "forged-token-value"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(StatusCode::FORBIDDEN, resp.status());
}

#[actix_rt::test]
async fn test_register_without_token_is_forbidden() {
    let app = test::init_service(
        App::new()
            .wrap(session_middleware())
            .service(liteforum::create_user::create_user_post),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/register")
        .set_form(&[
            ("username", "mallory"),
            ("password", "password123"),
            ("password_confirm", "password123"),
            ("captcha", "8"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(StatusCode::FORBIDDEN, resp.status());
}
