//! Private message mailbox pages

use super::see_other;
use super::topic::DeleteFormData;
use crate::db::get_db_pool;
use crate::messages::{self, MessageForTemplate, MessagePreview, SendError};
use crate::middleware::ClientCtx;
use crate::user::Profile;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Fixed paths before /messages/{id}.
    conf.service(view_inbox)
        .service(view_sent)
        .service(view_compose)
        .service(post_compose)
        .service(view_message)
        .service(post_delete_message);
}

#[derive(Template)]
#[template(path = "messages.html")]
struct MailboxTemplate {
    client: ClientCtx,
    /// "inbox" or "sent"
    folder: &'static str,
    messages: Vec<MessagePreview>,
    just_sent: bool,
}

#[derive(Template)]
#[template(path = "message_compose.html")]
struct ComposeTemplate {
    client: ClientCtx,
    errors: Vec<&'static str>,
    recipient: String,
    title: String,
    body: String,
}

#[derive(Template)]
#[template(path = "message.html")]
struct MessageTemplate {
    client: ClientCtx,
    message: MessageForTemplate,
}

impl MessageTemplate {
    fn is_inbound(&self) -> bool {
        self.client.get_id() == Some(self.message.recipient_id)
    }
}

#[derive(Deserialize)]
pub struct SentQuery {
    pub sent: Option<bool>,
}

#[derive(Deserialize)]
pub struct ComposeQuery {
    pub reply_to: Option<i32>,
    pub send_to: Option<i32>,
}

#[derive(Deserialize)]
pub struct ComposeFormData {
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub csrf_token: String,
}

#[get("/messages")]
pub async fn view_inbox(client: ClientCtx) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let messages = messages::inbox(get_db_pool(), user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(MailboxTemplate {
        client,
        folder: "inbox",
        messages,
        just_sent: false,
    }
    .to_response())
}

#[get("/messages/sent")]
pub async fn view_sent(
    client: ClientCtx,
    query: web::Query<SentQuery>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let messages = messages::sent(get_db_pool(), user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(MailboxTemplate {
        client,
        folder: "sent",
        messages,
        just_sent: query.sent.unwrap_or(false),
    }
    .to_response())
}

#[get("/messages/new")]
pub async fn view_compose(
    client: ClientCtx,
    query: web::Query<ComposeQuery>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();
    let mut recipient = String::new();
    let mut title = String::new();

    if let Some(reply_to) = query.reply_to {
        let source = messages::get_message(db, reply_to, user_id)
            .await
            .map_err(error::ErrorInternalServerError)?;
        if let Some(source) = source {
            recipient = source.sender_username;
            title = messages::reply_title(&source.title);
        }
    } else if let Some(send_to) = query.send_to {
        let profile = Profile::get_by_id(db, send_to)
            .await
            .map_err(error::ErrorInternalServerError)?;
        if let Some(profile) = profile {
            recipient = profile.name;
        }
    }

    Ok(ComposeTemplate {
        client,
        errors: Vec::new(),
        recipient,
        title,
        body: String::new(),
    }
    .to_response())
}

#[post("/messages/new")]
pub async fn post_compose(
    client: ClientCtx,
    session: Session,
    form: web::Form<ComposeFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_login()?;

    match messages::send_message(get_db_pool(), user_id, &form.recipient, &form.title, &form.body)
        .await
    {
        Ok(_) => Ok(see_other("/messages/sent?sent=true")),
        Err(SendError::Invalid(errors)) => {
            let form = form.into_inner();
            Ok(ComposeTemplate {
                client,
                errors,
                recipient: form.recipient,
                title: form.title,
                body: form.body,
            }
            .to_response())
        }
        Err(SendError::Database(e)) => {
            log::error!("post_compose: {}", e);
            Err(error::ErrorInternalServerError(
                "An error occurred while sending the message.",
            ))
        }
    }
}

#[get("/messages/{message_id}")]
pub async fn view_message(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let message = messages::get_message(db, path.into_inner(), user_id)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Message not found."))?;

    if message.recipient_id == user_id && !message.is_read {
        messages::mark_read(db, message.id, user_id)
            .await
            .map_err(error::ErrorInternalServerError)?;
    }

    Ok(MessageTemplate { client, message }.to_response())
}

#[post("/messages/{message_id}/delete")]
pub async fn post_delete_message(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<DeleteFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_login()?;
    let message_id = path.into_inner();

    let deleted = messages::delete_for_user(get_db_pool(), message_id, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    if !deleted {
        return Err(error::ErrorNotFound("Message not found."));
    }

    Ok(see_other("/messages"))
}
