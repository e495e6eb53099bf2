use super::see_other;
use crate::bbcode::quote_for_reply;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{forums, topics};
use crate::reactions::{get_user_reaction, reactions_for_posts, ReactionSummary, AVAILABLE_EMOJIS};
use crate::topics::{
    create_reply, delete_topic, find_forum, find_topic, posts_in_topic, validate_body,
    PostForTemplate,
};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_topic)
        .service(post_reply)
        .service(post_delete_topic);
}

/// A post with what the viewer needs to render its controls.
pub struct PostView {
    pub post: PostForTemplate,
    pub reactions: Vec<ReactionSummary>,
    pub can_modify: bool,
}

#[derive(Template)]
#[template(path = "topic.html")]
pub struct TopicTemplate {
    pub client: ClientCtx,
    pub topic: topics::Model,
    pub forum: Option<forums::Model>,
    pub posts: Vec<PostView>,
    pub errors: Vec<&'static str>,
    pub reply_body: String,
    /// Post whose reaction picker is open.
    pub react_on: Option<i32>,
    pub current_reaction: Option<String>,
    pub emojis: &'static [&'static str],
}

impl TopicTemplate {
    /// Takes a reference because template loops hand out `&i32`.
    pub fn picker_open(&self, post_id: &i32) -> bool {
        self.react_on == Some(*post_id)
    }

    pub fn is_current_reaction(&self, emoji: &str) -> bool {
        self.current_reaction.as_deref() == Some(emoji)
    }
}

#[derive(Deserialize)]
pub struct TopicQuery {
    /// Post to pre-fill the reply box with.
    pub quote: Option<i32>,
    pub react_on: Option<i32>,
}

#[derive(Deserialize)]
pub struct ReplyFormData {
    pub body: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct DeleteFormData {
    pub csrf_token: String,
}

pub(super) async fn get_topic_or_404(topic_id: i32) -> Result<topics::Model, Error> {
    find_topic(get_db_pool(), topic_id)
        .await
        .map_err(|_| error::ErrorInternalServerError("Could not look up topic."))?
        .ok_or_else(|| error::ErrorNotFound("Topic not found."))
}

async fn build_topic_template(
    client: ClientCtx,
    topic: topics::Model,
    query: &TopicQuery,
    errors: Vec<&'static str>,
    reply_body: Option<String>,
) -> Result<TopicTemplate, Error> {
    let db = get_db_pool();

    let forum = match topic.forum_id {
        Some(forum_id) => find_forum(db, forum_id)
            .await
            .map_err(error::ErrorInternalServerError)?,
        None => None,
    };

    let posts = posts_in_topic(db, topic.id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut reactions = reactions_for_posts(db, &post_ids)
        .await
        .map_err(error::ErrorInternalServerError)?;

    // Quoting a post from another topic is ignored.
    let reply_body = reply_body.unwrap_or_else(|| {
        query
            .quote
            .and_then(|id| posts.iter().find(|p| p.id == id))
            .map(|p| quote_for_reply(p.author(), &p.body))
            .unwrap_or_default()
    });

    let react_on = match (client.get_id(), query.react_on) {
        (Some(_), Some(id)) if post_ids.contains(&id) => Some(id),
        _ => None,
    };
    let current_reaction = match (client.get_id(), react_on) {
        (Some(user_id), Some(post_id)) => get_user_reaction(db, post_id, user_id)
            .await
            .map_err(error::ErrorInternalServerError)?,
        _ => None,
    };

    let posts = posts
        .into_iter()
        .map(|post| PostView {
            reactions: reactions.remove(&post.id).unwrap_or_default(),
            can_modify: client.can_modify(post.user_id),
            post,
        })
        .collect();

    Ok(TopicTemplate {
        client,
        topic,
        forum,
        posts,
        errors,
        reply_body,
        react_on,
        current_reaction,
        emojis: AVAILABLE_EMOJIS,
    })
}

#[get("/topics/{topic_id}")]
pub async fn view_topic(
    client: ClientCtx,
    path: web::Path<i32>,
    query: web::Query<TopicQuery>,
) -> Result<impl Responder, Error> {
    let topic = get_topic_or_404(path.into_inner()).await?;
    Ok(build_topic_template(client, topic, &query, Vec::new(), None)
        .await?
        .to_response())
}

#[post("/topics/{topic_id}/reply")]
pub async fn post_reply(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<ReplyFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_login()?;
    let topic = get_topic_or_404(path.into_inner()).await?;

    let max_length = crate::app_config::limits().max_post_length as usize;
    if let Err(e) = validate_body(&form.body, max_length) {
        let query = TopicQuery {
            quote: None,
            react_on: None,
        };
        let tmpl =
            build_topic_template(client, topic, &query, vec![e], Some(form.body.clone())).await?;
        return Ok(tmpl.to_response());
    }

    let post = create_reply(get_db_pool(), topic.id, user_id, &form.body)
        .await
        .map_err(|e| {
            log::error!("post_reply: {}", e);
            error::ErrorInternalServerError("Failed to save reply.")
        })?;

    Ok(see_other(&format!("/topics/{}#post-{}", topic.id, post.id)))
}

#[post("/topics/{topic_id}/delete")]
pub async fn post_delete_topic(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<DeleteFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    let user_id = client.require_staff()?;
    let topic = get_topic_or_404(path.into_inner()).await?;

    delete_topic(get_db_pool(), topic.id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    log::info!("Topic {} deleted by user {}", topic.id, user_id);

    Ok(match topic.forum_id {
        Some(forum_id) => see_other(&format!("/forums/{}", forum_id)),
        None => see_other("/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(react_on: Option<i32>, current_reaction: Option<&str>) -> TopicTemplate {
        TopicTemplate {
            client: ClientCtx::default(),
            topic: topics::Model {
                id: 1,
                forum_id: None,
                user_id: None,
                title: "Announcement".to_owned(),
                is_global: true,
                created_at: chrono::Utc::now().naive_utc(),
            },
            forum: None,
            posts: Vec::new(),
            errors: Vec::new(),
            reply_body: String::new(),
            react_on,
            current_reaction: current_reaction.map(str::to_owned),
            emojis: AVAILABLE_EMOJIS,
        }
    }

    #[test]
    fn reaction_picker_follows_query() {
        let page = template(Some(3), Some("🔥"));
        let ids = [3, 4];
        assert!(page.picker_open(&ids[0]));
        assert!(!page.picker_open(&ids[1]));
        assert!(!template(None, None).picker_open(&ids[0]));

        let current: Vec<&str> = page
            .emojis
            .iter()
            .filter(|emoji| page.is_current_reaction(emoji))
            .copied()
            .collect();
        assert_eq!(vec!["🔥"], current);
    }

    #[test]
    fn renders_for_guests() {
        let html = template(None, None).render().unwrap();
        assert!(html.contains("<h2>Announcement</h2>"));
        assert!(html.contains("to reply."));
    }
}
