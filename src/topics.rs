//! Topics, posts and the board listings built from them.
//!
//! Creation runs the quote trigger inside the same transaction as the
//! insert, so a post never commits without its notifications.

use crate::bbcode;
use crate::constants::DELETED_USERNAME;
use crate::notifications::dispatcher::notify_quoted_users;
use crate::orm::{categories, forums, posts, topics};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult,
    Set, Statement, TransactionTrait,
};

/// Trims a title and checks it against `max_chars`.
pub fn validate_title(title: &str, max_chars: usize) -> Result<&str, &'static str> {
    let title = title.trim();
    if title.is_empty() {
        Err("Title is required.")
    } else if title.chars().count() > max_chars {
        Err("Title is too long.")
    } else {
        Ok(title)
    }
}

/// Checks a body is non-blank and within `max_chars`. The body itself is
/// stored untrimmed.
pub fn validate_body(body: &str, max_chars: usize) -> Result<(), &'static str> {
    if body.trim().is_empty() {
        Err("Message body is required.")
    } else if body.chars().count() > max_chars {
        Err("Message body is too long.")
    } else {
        Ok(())
    }
}

async fn insert_post<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
    author_id: i32,
    body: &str,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        topic_id: Set(topic_id),
        user_id: Set(Some(author_id)),
        body: Set(body.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Creates a topic with its first post.
///
/// A global topic belongs to no forum; `forum_id` is ignored for it.
pub async fn create_topic(
    db: &DatabaseConnection,
    forum_id: Option<i32>,
    author_id: i32,
    title: &str,
    body: &str,
    is_global: bool,
) -> Result<(topics::Model, posts::Model), DbErr> {
    let forum_id = if is_global { None } else { forum_id };
    if !is_global && forum_id.is_none() {
        return Err(DbErr::Custom("non-global topic requires a forum".to_owned()));
    }

    let txn = db.begin().await?;

    let topic = topics::ActiveModel {
        forum_id: Set(forum_id),
        user_id: Set(Some(author_id)),
        title: Set(title.to_owned()),
        is_global: Set(is_global),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let post = insert_post(&txn, topic.id, author_id, body).await?;
    notify_quoted_users(&txn, body, author_id, topic.id, post.id).await?;

    txn.commit().await?;

    log::info!("Topic {} created by user {}", topic.id, author_id);
    Ok((topic, post))
}

/// Adds a reply to an existing topic.
pub async fn create_reply(
    db: &DatabaseConnection,
    topic_id: i32,
    author_id: i32,
    body: &str,
) -> Result<posts::Model, DbErr> {
    let txn = db.begin().await?;

    if topics::Entity::find_by_id(topic_id).one(&txn).await?.is_none() {
        return Err(DbErr::RecordNotFound(format!("topic {}", topic_id)));
    }

    let post = insert_post(&txn, topic_id, author_id, body).await?;
    notify_quoted_users(&txn, body, author_id, topic_id, post.id).await?;

    txn.commit().await?;
    Ok(post)
}

pub async fn find_topic<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
) -> Result<Option<topics::Model>, DbErr> {
    topics::Entity::find_by_id(topic_id).one(db).await
}

pub async fn find_post<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
) -> Result<Option<posts::Model>, DbErr> {
    posts::Entity::find_by_id(post_id).one(db).await
}

pub async fn find_forum<C: ConnectionTrait>(
    db: &C,
    forum_id: i32,
) -> Result<Option<forums::Model>, DbErr> {
    forums::Entity::find_by_id(forum_id).one(db).await
}

/// Replaces a post body. Edits never notify.
pub async fn update_post_body<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    body: &str,
) -> Result<(), DbErr> {
    let post = find_post(db, post_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("post {}", post_id)))?;

    let mut active: posts::ActiveModel = post.into();
    active.body = Set(body.to_owned());
    active.update(db).await?;
    Ok(())
}

/// Deletes one post; its reactions and notifications cascade.
pub async fn delete_post<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<u64, DbErr> {
    Ok(posts::Entity::delete_by_id(post_id)
        .exec(db)
        .await?
        .rows_affected)
}

/// Deletes a topic and, by cascade, its posts.
pub async fn delete_topic<C: ConnectionTrait>(db: &C, topic_id: i32) -> Result<u64, DbErr> {
    Ok(topics::Entity::delete_by_id(topic_id)
        .exec(db)
        .await?
        .rows_affected)
}

/// Most recently created topic on the board.
pub async fn latest_topic<C: ConnectionTrait>(db: &C) -> Result<Option<topics::Model>, DbErr> {
    topics::Entity::find()
        .order_by_desc(topics::Column::CreatedAt)
        .order_by_desc(topics::Column::Id)
        .one(db)
        .await
}

/// Topic row for forum and index listings.
#[derive(Clone, Debug, FromQueryResult)]
pub struct TopicForList {
    pub id: i32,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub user_id: Option<i32>,
    pub author_username: Option<String>,
    pub post_count: i64,
}

impl TopicForList {
    pub fn author(&self) -> &str {
        self.author_username.as_deref().unwrap_or(DELETED_USERNAME)
    }

    /// Posts after the opening one.
    pub fn reply_count(&self) -> i64 {
        (self.post_count - 1).max(0)
    }
}

const TOPIC_LIST_SELECT: &str = r#"
    SELECT
        t.id,
        t.title,
        t.created_at,
        t.user_id,
        u.username AS author_username,
        (SELECT COUNT(p.id) FROM posts p WHERE p.topic_id = t.id) AS post_count
    FROM topics t
    LEFT JOIN users u ON t.user_id = u.id
"#;

/// Topics of one forum, newest first.
pub async fn topics_in_forum<C: ConnectionTrait>(
    db: &C,
    forum_id: i32,
) -> Result<Vec<TopicForList>, DbErr> {
    let sql = format!(
        "{} WHERE t.forum_id = ? ORDER BY t.created_at DESC, t.id DESC",
        TOPIC_LIST_SELECT
    );

    TopicForList::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        &sql,
        vec![forum_id.into()],
    ))
    .all(db)
    .await
}

/// Global topics, newest first.
pub async fn global_topics<C: ConnectionTrait>(db: &C) -> Result<Vec<TopicForList>, DbErr> {
    let sql = format!(
        "{} WHERE t.is_global = 1 ORDER BY t.created_at DESC, t.id DESC",
        TOPIC_LIST_SELECT
    );

    TopicForList::find_by_statement(Statement::from_string(DbBackend::Sqlite, sql))
        .all(db)
        .await
}

/// A post joined with its author, as shown in a topic.
#[derive(Clone, Debug, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub topic_id: i32,
    pub user_id: Option<i32>,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub username: Option<String>,
    pub role: Option<String>,
    pub user_joined: Option<NaiveDateTime>,
}

impl PostForTemplate {
    pub fn author(&self) -> &str {
        self.username.as_deref().unwrap_or(DELETED_USERNAME)
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("")
    }

    pub fn render_body(&self) -> String {
        bbcode::render(&self.body)
    }
}

/// Posts of a topic, oldest first.
pub async fn posts_in_topic<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
) -> Result<Vec<PostForTemplate>, DbErr> {
    let sql = r#"
        SELECT
            p.id,
            p.topic_id,
            p.user_id,
            p.body,
            p.created_at,
            u.username,
            u.role,
            u.created_at AS user_joined
        FROM posts p
        LEFT JOIN users u ON p.user_id = u.id
        WHERE p.topic_id = ?
        ORDER BY p.created_at ASC, p.id ASC
    "#;

    PostForTemplate::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![topic_id.into()],
    ))
    .all(db)
    .await
}

/// A post with its topic title, for profiles and search.
#[derive(Clone, Debug, FromQueryResult)]
pub struct PostWithTopic {
    pub post_id: i32,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub topic_id: i32,
    pub topic_title: String,
    pub user_id: Option<i32>,
    pub author_username: Option<String>,
}

impl PostWithTopic {
    pub fn author(&self) -> &str {
        self.author_username.as_deref().unwrap_or(DELETED_USERNAME)
    }

    pub fn render_body(&self) -> String {
        bbcode::render(&self.body)
    }

    /// Rendered body with `term` highlighted.
    pub fn render_highlighted(&self, term: &str) -> String {
        bbcode::highlight(&self.render_body(), term)
    }

    pub fn get_url(&self) -> String {
        format!("/topics/{}#post-{}", self.topic_id, self.post_id)
    }
}

const POST_WITH_TOPIC_SELECT: &str = r#"
    SELECT
        p.id AS post_id,
        p.body,
        p.created_at,
        t.id AS topic_id,
        t.title AS topic_title,
        p.user_id,
        u.username AS author_username
    FROM posts p
    JOIN topics t ON p.topic_id = t.id
    LEFT JOIN users u ON p.user_id = u.id
"#;

/// Everything a user has posted, newest first.
pub async fn posts_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<PostWithTopic>, DbErr> {
    let sql = format!(
        "{} WHERE p.user_id = ? ORDER BY p.created_at DESC, p.id DESC",
        POST_WITH_TOPIC_SELECT
    );

    PostWithTopic::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        &sql,
        vec![user_id.into()],
    ))
    .all(db)
    .await
}

/// Escapes LIKE wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Posts whose body contains `query`, newest first. Blank queries match
/// nothing.
pub async fn search_posts<C: ConnectionTrait>(
    db: &C,
    query: &str,
    limit: u32,
) -> Result<Vec<PostWithTopic>, DbErr> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "{} WHERE p.body LIKE ? ESCAPE '\\' ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
        POST_WITH_TOPIC_SELECT
    );

    PostWithTopic::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        &sql,
        vec![like_pattern(query).into(), (limit as i64).into()],
    ))
    .all(db)
    .await
}

/// A forum with its activity figures for the index.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ForumWithStats {
    pub category_id: i32,
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub topic_count: i64,
    pub post_count: i64,
    pub last_post_at: Option<NaiveDateTime>,
    pub last_post_topic_id: Option<i32>,
    pub last_post_author: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CategoryWithForums {
    pub id: i32,
    pub title: String,
    pub forums: Vec<ForumWithStats>,
}

/// Categories in display order, each with its forums and their stats.
/// Categories without forums are included with an empty list.
pub async fn categories_with_forums<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<CategoryWithForums>, DbErr> {
    let sql = r#"
        SELECT
            f.category_id,
            f.id,
            f.title,
            f.description,
            (SELECT COUNT(t.id) FROM topics t WHERE t.forum_id = f.id) AS topic_count,
            (SELECT COUNT(p.id) FROM posts p JOIN topics t ON p.topic_id = t.id
                WHERE t.forum_id = f.id) AS post_count,
            (SELECT p.created_at FROM posts p JOIN topics t ON p.topic_id = t.id
                WHERE t.forum_id = f.id ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_at,
            (SELECT t.id FROM posts p JOIN topics t ON p.topic_id = t.id
                WHERE t.forum_id = f.id ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_topic_id,
            (SELECT u.username FROM posts p JOIN topics t ON p.topic_id = t.id
                JOIN users u ON p.user_id = u.id
                WHERE t.forum_id = f.id ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_author
        FROM forums f
        ORDER BY f.sort_order, f.title
    "#;

    let categories = categories::Entity::find()
        .order_by_asc(categories::Column::SortOrder)
        .order_by_asc(categories::Column::Title)
        .all(db)
        .await?;

    let forums = ForumWithStats::find_by_statement(Statement::from_string(
        DbBackend::Sqlite,
        sql.to_owned(),
    ))
    .all(db)
    .await?;

    Ok(categories
        .into_iter()
        .map(|category| CategoryWithForums {
            forums: forums
                .iter()
                .filter(|f| f.category_id == category.id)
                .cloned()
                .collect(),
            id: category.id,
            title: category.title,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert_eq!(Ok("Hello"), validate_title("  Hello ", 10));
        assert_eq!(Err("Title is required."), validate_title("   ", 10));
        assert_eq!(Err("Title is too long."), validate_title("abcdefghijk", 10));
        assert_eq!(Ok("çççççççççç"), validate_title("çççççççççç", 10));
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body("hi", 10).is_ok());
        assert!(validate_body(" \n ", 10).is_err());
        assert!(validate_body("01234567890", 10).is_err());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!("%foo%", like_pattern("foo"));
        assert_eq!("%100\\%%", like_pattern("100%"));
        assert_eq!("%a\\_b%", like_pattern("a_b"));
    }
}
