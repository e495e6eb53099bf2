use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::announcements;
use crate::topics::{categories_with_forums, global_topics, CategoryWithForums, TopicForList};
use crate::user::{active_users, forum_stats, ActiveUser, ForumStats};
use actix_web::{error, get, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub announcement: Option<announcements::Model>,
    pub global_topics: Vec<TopicForList>,
    pub categories: Vec<CategoryWithForums>,
    pub stats: ForumStats,
    pub active_users: Vec<ActiveUser>,
}

impl IndexTemplate {
    pub fn render_announcement(&self, announcement: &announcements::Model) -> String {
        crate::bbcode::render(&announcement.body)
    }
}

#[get("/")]
pub async fn view_index(client: ClientCtx) -> Result<impl Responder, Error> {
    let db = get_db_pool();
    let window = crate::app_config::security().active_window_seconds;

    let announcement = crate::admin::latest_announcement(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let global_topics = global_topics(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let categories = categories_with_forums(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let stats = forum_stats(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let active_users = active_users(db, window)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(IndexTemplate {
        client,
        announcement,
        global_topics,
        categories,
        stats,
        active_users,
    }
    .to_response())
}
