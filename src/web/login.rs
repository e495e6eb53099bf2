use super::see_other;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::session::{start_session, verify_password};
use crate::user::find_by_username;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ConnectionTrait, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub error: Option<&'static str>,
    pub registered: bool,
    pub username: &'a str,
}

#[derive(Deserialize)]
pub struct FormData {
    username: String,
    password: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    registered: Option<bool>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResultStatus {
    Success,
    BadName,
    BadPassword,
}

pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user_id: Option<i32>,
}

impl LoginResult {
    fn success(user_id: i32) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user_id: Some(user_id),
        }
    }
    fn fail(result: LoginResultStatus) -> Self {
        Self {
            result,
            user_id: None,
        }
    }
}

/// Checks a username and password pair.
pub async fn login<C: ConnectionTrait>(db: &C, name: &str, pass: &str) -> Result<LoginResult, DbErr> {
    let user = match find_by_username(db, name.trim()).await? {
        Some(user) => user,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadName)),
    };

    if !verify_password(&user.password, pass) {
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    Ok(LoginResult::success(user.id))
}

#[post("/login")]
pub async fn post_login(
    client: ClientCtx,
    session: Session,
    form: web::Form<FormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;

    let result = login(get_db_pool(), &form.username, &form.password)
        .await
        .map_err(|e| {
            log::error!("error {:?}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    match (result.result, result.user_id) {
        (LoginResultStatus::Success, Some(user_id)) => {
            start_session(&session, user_id)?;
            log::info!("User {} logged in", user_id);
            Ok(see_other("/"))
        }
        (status, _) => {
            log::debug!("login failure: {:?} for {}", status, form.username);
            // Same message either way to avoid username enumeration.
            Ok(LoginTemplate {
                client,
                error: Some("Invalid username or password."),
                registered: false,
                username: form.username.trim(),
            }
            .to_response())
        }
    }
}

#[get("/login")]
pub async fn view_login(
    client: ClientCtx,
    query: web::Query<LoginQuery>,
) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(see_other("/"));
    }

    Ok(LoginTemplate {
        client,
        error: None,
        registered: query.registered.unwrap_or(false),
        username: "",
    }
    .to_response())
}
