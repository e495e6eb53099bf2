use super::see_other;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::forums;
use crate::topics::{create_topic, find_forum, topics_in_forum, validate_body, validate_title, TopicForList};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_forum)
        .service(view_new_topic)
        .service(post_new_topic);
}

#[derive(Template)]
#[template(path = "forum.html")]
pub struct ForumTemplate {
    pub client: ClientCtx,
    pub forum: forums::Model,
    pub topics: Vec<TopicForList>,
}

#[derive(Template)]
#[template(path = "new_topic.html")]
pub struct NewTopicTemplate<'a> {
    pub client: ClientCtx,
    pub forum: forums::Model,
    pub errors: Vec<&'static str>,
    pub title: &'a str,
    pub body: &'a str,
    pub is_global: bool,
}

#[derive(Deserialize)]
pub struct NewTopicFormData {
    pub title: String,
    pub body: String,
    /// Checkbox; only honoured for admins.
    pub is_global: Option<String>,
    pub csrf_token: String,
}

async fn get_forum_or_404(forum_id: i32) -> Result<forums::Model, Error> {
    find_forum(get_db_pool(), forum_id)
        .await
        .map_err(|_| error::ErrorInternalServerError("Could not look up forum."))?
        .ok_or_else(|| error::ErrorNotFound("Forum not found."))
}

#[get("/forums/{forum_id}")]
pub async fn view_forum(client: ClientCtx, path: web::Path<i32>) -> Result<impl Responder, Error> {
    let forum = get_forum_or_404(path.into_inner()).await?;
    let topics = topics_in_forum(get_db_pool(), forum.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(ForumTemplate {
        client,
        forum,
        topics,
    }
    .to_response())
}

#[get("/forums/{forum_id}/new-topic")]
pub async fn view_new_topic(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    let forum = get_forum_or_404(path.into_inner()).await?;

    Ok(NewTopicTemplate {
        client,
        forum,
        errors: Vec::new(),
        title: "",
        body: "",
        is_global: false,
    }
    .to_response())
}

#[post("/forums/{forum_id}/new-topic")]
pub async fn post_new_topic(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<NewTopicFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_login()?;
    let forum = get_forum_or_404(path.into_inner()).await?;

    let is_global = form.is_global.is_some();
    if is_global {
        client.require_admin().map_err(|e| {
            log::warn!("post_new_topic: non-admin {} tried to post a global topic", user_id);
            e
        })?;
    }

    let limits = crate::app_config::limits();
    let mut errors = Vec::new();
    let title = match validate_title(&form.title, limits.max_title_length as usize) {
        Ok(title) => title,
        Err(e) => {
            errors.push(e);
            ""
        }
    };
    if let Err(e) = validate_body(&form.body, limits.max_post_length as usize) {
        errors.push(e);
    }

    if !errors.is_empty() {
        return Ok(NewTopicTemplate {
            client,
            forum,
            errors,
            title: form.title.trim(),
            body: &form.body,
            is_global,
        }
        .to_response());
    }

    let (topic, post) = create_topic(
        get_db_pool(),
        Some(forum.id),
        user_id,
        title,
        &form.body,
        is_global,
    )
    .await
    .map_err(|e| {
        log::error!("post_new_topic: {}", e);
        error::ErrorInternalServerError("Failed to create topic.")
    })?;

    Ok(see_other(&format!("/topics/{}#post-{}", topic.id, post.id)))
}
