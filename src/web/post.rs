use super::see_other;
use super::topic::{get_topic_or_404, DeleteFormData};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{posts, topics};
use crate::topics::{delete_post, find_post, update_post_body, validate_body};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(edit_post)
        .service(update_post)
        .service(post_delete_post);
}

#[derive(Deserialize)]
pub struct EditPostFormData {
    pub body: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "post_edit.html")]
pub struct PostEditTemplate<'a> {
    pub client: ClientCtx,
    pub post: posts::Model,
    pub topic: topics::Model,
    pub errors: Vec<&'static str>,
    pub body: &'a str,
}

pub(super) async fn get_post_or_404(post_id: i32) -> Result<posts::Model, Error> {
    find_post(get_db_pool(), post_id)
        .await
        .map_err(|_| error::ErrorInternalServerError("Could not look up post."))?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

#[get("/posts/{post_id}/edit")]
pub async fn edit_post(client: ClientCtx, path: web::Path<i32>) -> Result<impl Responder, Error> {
    let post = get_post_or_404(path.into_inner()).await?;
    client.require_ownership(post.user_id)?;
    let topic = get_topic_or_404(post.topic_id).await?;
    let body = post.body.clone();

    Ok(PostEditTemplate {
        client,
        post,
        topic,
        errors: Vec::new(),
        body: &body,
    }
    .to_response())
}

#[post("/posts/{post_id}/edit")]
pub async fn update_post(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<EditPostFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let post = get_post_or_404(path.into_inner()).await?;
    let user_id = client.require_ownership(post.user_id)?;

    let max_length = crate::app_config::limits().max_post_length as usize;
    if let Err(e) = validate_body(&form.body, max_length) {
        let topic = get_topic_or_404(post.topic_id).await?;
        return Ok(PostEditTemplate {
            client,
            post,
            topic,
            errors: vec![e],
            body: &form.body,
        }
        .to_response());
    }

    update_post_body(get_db_pool(), post.id, &form.body)
        .await
        .map_err(error::ErrorInternalServerError)?;
    log::debug!("Post {} edited by user {}", post.id, user_id);

    Ok(see_other(&format!("/topics/{}#post-{}", post.topic_id, post.id)))
}

#[post("/posts/{post_id}/delete")]
pub async fn post_delete_post(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<DeleteFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let post = get_post_or_404(path.into_inner()).await?;
    let user_id = client.require_ownership(post.user_id)?;

    delete_post(get_db_pool(), post.id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    log::info!("Post {} deleted by user {}", post.id, user_id);

    Ok(see_other(&format!("/topics/{}", post.topic_id)))
}
