//! Quote and reaction notifications
//!
//! Rows are only ever written through [`create_notification`], which
//! refuses self-notifications. The triggers in [`dispatcher`] run inside
//! the caller's transaction so a failed insert rolls back the post or
//! reaction that caused it.

pub mod dispatcher;
pub mod types;

use crate::orm::notifications;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DbBackend, DbErr, FromQueryResult,
    PaginatorTrait, Set, Statement,
};

pub use types::{NotificationKind, UnknownNotificationKind};

/// Target, actor and location of a new notification.
#[derive(Clone, Copy, Debug)]
pub struct NewNotification {
    pub user_id: i32,
    pub actor_id: i32,
    pub topic_id: i32,
    pub post_id: i32,
    pub kind: NotificationKind,
}

/// Create a notification for a user.
/// Returns None without writing when actor and target are the same user.
pub async fn create_notification<C: ConnectionTrait>(
    db: &C,
    new: NewNotification,
) -> Result<Option<notifications::Model>, DbErr> {
    if new.user_id == new.actor_id {
        return Ok(None);
    }

    let notification = notifications::ActiveModel {
        user_id: Set(new.user_id),
        actor_id: Set(new.actor_id),
        topic_id: Set(new.topic_id),
        post_id: Set(new.post_id),
        kind: Set(new.kind.as_str().to_owned()),
        is_read: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    notification.insert(db).await.map(Some)
}

/// Count unread notifications for a user
pub async fn count_unread_notifications<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<i64, DbErr> {
    let count = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .count(db)
        .await?;

    Ok(count as i64)
}

/// Mark all notifications as read for a user
pub async fn mark_all_read<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), DbErr> {
    notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(())
}

/// Notification joined with the names needed to display it.
#[derive(Clone, Debug, FromQueryResult)]
pub struct NotificationForTemplate {
    pub id: i32,
    pub actor_id: i32,
    pub topic_id: i32,
    pub post_id: i32,
    pub kind: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub actor_username: String,
    pub topic_title: String,
}

impl NotificationForTemplate {
    pub fn describe(&self) -> &'static str {
        self.kind
            .parse::<NotificationKind>()
            .map(|kind| kind.describe())
            .unwrap_or("mentioned you in")
    }

    pub fn get_url(&self) -> String {
        format!("/topics/{}#post-{}", self.topic_id, self.post_id)
    }
}

/// Fetch all notifications for a user, newest first
pub async fn get_user_notifications<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<NotificationForTemplate>, DbErr> {
    let sql = r#"
        SELECT
            n.id,
            n.actor_id,
            n.topic_id,
            n.post_id,
            n.kind,
            n.is_read,
            n.created_at,
            a.username AS actor_username,
            t.title AS topic_title
        FROM notifications n
        JOIN users a ON n.actor_id = a.id
        JOIN topics t ON n.topic_id = t.id
        WHERE n.user_id = ?
        ORDER BY n.created_at DESC, n.id DESC
    "#;

    NotificationForTemplate::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![user_id.into()],
    ))
    .all(db)
    .await
}
