use crate::app_config::CaptchaConfig;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::reactions::is_unique_violation;
use crate::session::hash_password;
use crate::user::{find_by_username, Role};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, ConnectionTrait, DbErr};
use serde::Deserialize;
use std::fmt;
use validator::Validate;

static USERNAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

pub(crate) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_user_get).service(create_user_post);
}

#[derive(Default, Deserialize, Validate)]
pub struct FormData {
    #[validate(
        length(
            min = 3,
            max = 20,
            message = "Username must be between 3 and 20 characters."
        ),
        regex(
            path = "USERNAME_CHARS",
            message = "Username can only contain letters, numbers, and underscores."
        )
    )]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[validate(length(
        min = 8,
        message = "Password must be at least 8 characters long."
    ))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub password_confirm: String,
    #[serde(default)]
    pub captcha: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl FormData {
    /// Trims the text fields the way they are stored. Passwords are kept as typed.
    fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_owned(),
            display_name: self.display_name.trim().to_owned(),
            password: self.password.clone(),
            password_confirm: self.password_confirm.clone(),
            captcha: self.captcha.trim().to_owned(),
            csrf_token: self.csrf_token.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct CreateUserTemplate<'a> {
    pub client: ClientCtx,
    pub captcha_question: Option<String>,
    pub errors: Vec<String>,
    pub username: &'a str,
    pub display_name: &'a str,
}

#[derive(Debug)]
pub enum RegisterError {
    /// User-facing messages, in form order.
    Invalid(Vec<String>),
    Hash(String),
    Database(DbErr),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "invalid registration: {}", errors.join(" ")),
            Self::Hash(e) => write!(f, "password hashing failed: {}", e),
            Self::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for RegisterError {}

impl From<DbErr> for RegisterError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

/// Checks the form without touching the database. Messages come back in
/// field order: captcha, username, password.
pub fn validate_form(form: &FormData, captcha: &CaptchaConfig) -> Vec<String> {
    let mut messages = Vec::new();

    if !crate::captcha::verify_with(captcha, &form.captcha) {
        messages.push("Incorrect CAPTCHA answer.".to_owned());
    }

    if let Err(errors) = form.validate() {
        let fields = errors.field_errors();
        for field in ["username", "password", "password_confirm"] {
            if let Some(first) = fields.get(field).and_then(|errs| errs.first()) {
                if let Some(message) = &first.message {
                    messages.push(message.to_string());
                }
            }
        }
    }

    messages
}

pub async fn insert_new_user<C: ConnectionTrait>(
    db: &C,
    name: &str,
    display_name: &str,
    password_hash: &str,
) -> Result<users::Model, DbErr> {
    let display_name = if display_name.is_empty() {
        name
    } else {
        display_name
    };

    users::ActiveModel {
        username: Set(name.to_owned()),
        password: Set(password_hash.to_owned()),
        display_name: Set(Some(display_name.to_owned())),
        role: Set(Role::Member.as_str().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Validates and creates a member account.
pub async fn register<C: ConnectionTrait>(
    db: &C,
    form: &FormData,
    captcha: &CaptchaConfig,
) -> Result<users::Model, RegisterError> {
    let form = form.normalized();
    let mut errors = validate_form(&form, captcha);

    if !form.username.is_empty() && find_by_username(db, &form.username).await?.is_some() {
        errors.push("This username is already taken.".to_owned());
    }

    if !errors.is_empty() {
        return Err(RegisterError::Invalid(errors));
    }

    let password_hash =
        hash_password(&form.password).map_err(|e| RegisterError::Hash(e.to_string()))?;

    match insert_new_user(db, &form.username, &form.display_name, &password_hash).await {
        Ok(user) => {
            log::info!("New user registered: {} (user_id: {})", user.username, user.id);
            Ok(user)
        }
        // Lost a race with another registration for the same name.
        Err(e) if is_unique_violation(&e) => Err(RegisterError::Invalid(vec![
            "This username is already taken.".to_owned(),
        ])),
        Err(e) => Err(e.into()),
    }
}

#[get("/register")]
pub async fn create_user_get(client: ClientCtx) -> impl Responder {
    CreateUserTemplate {
        client,
        captcha_question: crate::captcha::get_question(),
        errors: Vec::new(),
        username: "",
        display_name: "",
    }
    .to_response()
}

#[post("/register")]
pub async fn create_user_post(
    client: ClientCtx,
    session: Session,
    form: web::Form<FormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;

    match register(get_db_pool(), &form, &crate::app_config::captcha()).await {
        Ok(_) => Ok(HttpResponse::SeeOther()
            .append_header(("Location", "/login?registered=true"))
            .finish()),
        Err(RegisterError::Invalid(errors)) => Ok(CreateUserTemplate {
            client,
            captcha_question: crate::captcha::get_question(),
            errors,
            username: form.username.trim(),
            display_name: form.display_name.trim(),
        }
        .to_response()),
        Err(e) => {
            log::error!("create_user_post: {}", e);
            Err(error::ErrorInternalServerError("Failed to create user"))
        }
    }
}
