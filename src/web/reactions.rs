//! Post reaction endpoint

use super::see_other;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::reactions::{toggle_reaction, ReactionError};
use actix_session::Session;
use actix_web::{error, post, web, Error, HttpResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_reaction);
}

#[derive(Deserialize)]
pub struct ReactionFormData {
    pub emoji: String,
    pub csrf_token: String,
}

/// Adds, changes or removes the viewer's reaction, then returns to the post.
#[post("/posts/{post_id}/react")]
async fn post_reaction(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<ReactionFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_login()?;
    let post_id = path.into_inner();

    let outcome = toggle_reaction(get_db_pool(), post_id, user_id, &form.emoji)
        .await
        .map_err(|e| match e {
            ReactionError::InvalidEmoji => error::ErrorBadRequest("Invalid reaction."),
            ReactionError::PostNotFound => error::ErrorNotFound("Post not found."),
            ReactionError::Database(e) => {
                log::error!("post_reaction: {}", e);
                error::ErrorInternalServerError("Failed to save reaction.")
            }
        })?;
    log::debug!("Reaction on post {} by user {}: {:?}", post_id, user_id, outcome);

    // The topic comes from the post row, never from the form.
    let post = super::post::get_post_or_404(post_id).await?;
    Ok(see_other(&format!("/topics/{}#post-{}", post.topic_id, post.id)))
}
