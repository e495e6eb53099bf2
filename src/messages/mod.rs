//! Private messages between two users
//!
//! Each message has one sender and one recipient. Deleting hides the
//! message from the deleting side only.

use crate::orm::private_messages;
use crate::user::get_user_id_from_name;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, DbBackend, DbErr,
    FromQueryResult, PaginatorTrait, Statement,
};
use std::fmt;

const REPLY_PREFIX: &str = "Re: ";

/// Title for a reply, with a single "Re: " prefix.
pub fn reply_title(original: &str) -> String {
    if original.starts_with(REPLY_PREFIX) {
        original.to_owned()
    } else {
        format!("{}{}", REPLY_PREFIX, original)
    }
}

#[derive(Debug)]
pub enum SendError {
    /// User-facing messages, in form order.
    Invalid(Vec<&'static str>),
    Database(DbErr),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "invalid message: {}", errors.join(" ")),
            Self::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for SendError {}

impl From<DbErr> for SendError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

/// Send a message to the user named `recipient`. Every problem with the
/// input is reported at once.
pub async fn send_message<C: ConnectionTrait>(
    db: &C,
    sender_id: i32,
    recipient: &str,
    title: &str,
    body: &str,
) -> Result<private_messages::Model, SendError> {
    let recipient = recipient.trim();
    let title = title.trim();
    let body = body.trim();
    let mut errors = Vec::new();

    let recipient_id = if recipient.is_empty() {
        errors.push("Recipient username is required.");
        None
    } else {
        let id = get_user_id_from_name(db, recipient).await?;
        match id {
            None => errors.push("Recipient not found."),
            Some(id) if id == sender_id => errors.push("You cannot send a message to yourself."),
            Some(_) => {}
        }
        id
    };
    if title.is_empty() {
        errors.push("Subject is required.");
    }
    if body.is_empty() {
        errors.push("Message body is required.");
    }

    let recipient_id = match recipient_id {
        Some(id) if errors.is_empty() => id,
        _ => return Err(SendError::Invalid(errors)),
    };

    let message = private_messages::ActiveModel {
        sender_id: Set(sender_id),
        recipient_id: Set(recipient_id),
        title: Set(title.to_owned()),
        body: Set(body.to_owned()),
        is_read: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        sender_deleted: Set(false),
        recipient_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::debug!(
        "send_message: {} from user {} to user {}",
        message.id,
        sender_id,
        recipient_id
    );

    Ok(message)
}

/// Count unread messages still in a user's inbox
pub async fn count_unread<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<i64, DbErr> {
    let count = private_messages::Entity::find()
        .filter(private_messages::Column::RecipientId.eq(user_id))
        .filter(private_messages::Column::IsRead.eq(false))
        .filter(private_messages::Column::RecipientDeleted.eq(false))
        .count(db)
        .await?;

    Ok(count as i64)
}

/// Mailbox row. `other_*` is the sender in the inbox and the recipient in
/// the sent box.
#[derive(Clone, Debug, FromQueryResult)]
pub struct MessagePreview {
    pub id: i32,
    pub title: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub other_user_id: i32,
    pub other_username: String,
}

/// Messages received by a user, newest first
pub async fn inbox<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<MessagePreview>, DbErr> {
    let sql = r#"
        SELECT pm.id, pm.title, pm.is_read, pm.created_at,
            u.id AS other_user_id, u.username AS other_username
        FROM private_messages pm
        JOIN users u ON pm.sender_id = u.id
        WHERE pm.recipient_id = ? AND pm.recipient_deleted = 0
        ORDER BY pm.created_at DESC, pm.id DESC
    "#;

    MessagePreview::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![user_id.into()],
    ))
    .all(db)
    .await
}

/// Messages sent by a user, newest first
pub async fn sent<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<MessagePreview>, DbErr> {
    let sql = r#"
        SELECT pm.id, pm.title, pm.is_read, pm.created_at,
            u.id AS other_user_id, u.username AS other_username
        FROM private_messages pm
        JOIN users u ON pm.recipient_id = u.id
        WHERE pm.sender_id = ? AND pm.sender_deleted = 0
        ORDER BY pm.created_at DESC, pm.id DESC
    "#;

    MessagePreview::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![user_id.into()],
    ))
    .all(db)
    .await
}

/// A full message with both participants' names.
#[derive(Clone, Debug, FromQueryResult)]
pub struct MessageForTemplate {
    pub id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub sender_deleted: bool,
    pub recipient_deleted: bool,
    pub sender_username: String,
    pub recipient_username: String,
}

impl MessageForTemplate {
    /// True when `user_id` has removed this message from their mailbox.
    pub fn deleted_for(&self, user_id: i32) -> bool {
        (self.sender_id == user_id && self.sender_deleted)
            || (self.recipient_id == user_id && self.recipient_deleted)
    }

    pub fn render_body(&self) -> String {
        crate::bbcode::render(&self.body)
    }
}

/// Fetch a message if `user_id` is its sender or recipient
/// and has not deleted it from their side.
pub async fn get_message<C: ConnectionTrait>(
    db: &C,
    message_id: i32,
    user_id: i32,
) -> Result<Option<MessageForTemplate>, DbErr> {
    let sql = r#"
        SELECT pm.id, pm.sender_id, pm.recipient_id, pm.title, pm.body, pm.is_read,
            pm.created_at, pm.sender_deleted, pm.recipient_deleted,
            s.username AS sender_username, r.username AS recipient_username
        FROM private_messages pm
        JOIN users s ON pm.sender_id = s.id
        JOIN users r ON pm.recipient_id = r.id
        WHERE pm.id = ?
    "#;

    let message = MessageForTemplate::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![message_id.into()],
    ))
    .one(db)
    .await?;

    Ok(message.filter(|m| {
        (m.sender_id == user_id || m.recipient_id == user_id) && !m.deleted_for(user_id)
    }))
}

/// Mark a message as read. Only the recipient can do this.
pub async fn mark_read<C: ConnectionTrait>(
    db: &C,
    message_id: i32,
    user_id: i32,
) -> Result<(), DbErr> {
    private_messages::Entity::update_many()
        .col_expr(private_messages::Column::IsRead, Expr::value(true))
        .filter(private_messages::Column::Id.eq(message_id))
        .filter(private_messages::Column::RecipientId.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Remove a message from one user's mailbox.
/// Returns false when the user is not a participant.
pub async fn delete_for_user<C: ConnectionTrait>(
    db: &C,
    message_id: i32,
    user_id: i32,
) -> Result<bool, DbErr> {
    let message = match private_messages::Entity::find_by_id(message_id).one(db).await? {
        Some(message) => message,
        None => return Ok(false),
    };

    let is_sender = message.sender_id == user_id;
    let is_recipient = message.recipient_id == user_id;
    if !is_sender && !is_recipient {
        return Ok(false);
    }

    let mut active: private_messages::ActiveModel = message.into();
    if is_sender {
        active.sender_deleted = Set(true);
    }
    if is_recipient {
        active.recipient_deleted = Set(true);
    }
    active.update(db).await?;

    Ok(true)
}
