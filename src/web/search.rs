//! Post search
//!
//! A plain substring match over post bodies. An empty query shows the form
//! alone.
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::topics::{search_posts, PostWithTopic};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(search);
}

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    client: ClientCtx,
    query: String,
    results: Option<Vec<PostWithTopic>>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// GET /search?q=query
#[get("/search")]
pub async fn search(
    client: ClientCtx,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, Error> {
    let query = query
        .into_inner()
        .q
        .map(|q| q.trim().to_owned())
        .unwrap_or_default();

    let results = if query.is_empty() {
        None
    } else {
        let limit = crate::app_config::limits().search_results;
        Some(
            search_posts(get_db_pool(), &query, limit)
                .await
                .map_err(error::ErrorInternalServerError)?,
        )
    };

    Ok(SearchTemplate {
        client,
        query,
        results,
    }
    .to_response())
}
