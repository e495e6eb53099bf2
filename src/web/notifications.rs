//! Notification list
//!
//! Viewing the list marks every notification as read. The rows are
//! fetched first so the page still highlights what was new.
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::notifications::{self, NotificationForTemplate};
use actix_web::{error, get, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_notifications);
}

#[derive(Template)]
#[template(path = "notifications.html")]
struct NotificationsTemplate {
    client: ClientCtx,
    notifications: Vec<NotificationForTemplate>,
}

/// GET /notifications - View notification list
#[get("/notifications")]
pub async fn view_notifications(client: ClientCtx) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let notifications = notifications::get_user_notifications(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    notifications::mark_all_read(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(NotificationsTemplate {
        client,
        notifications,
    }
    .to_response())
}
