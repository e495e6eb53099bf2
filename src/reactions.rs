//! Emoji reactions on posts
//!
//! Each user holds at most one reaction per post, enforced by
//! UNIQUE (post_id, user_id). [`toggle_reaction`] moves that slot between
//! absent and set:
//!
//! | current  | submitted | result   | notifies |
//! |----------|-----------|----------|----------|
//! | absent   | E         | set(E)   | yes      |
//! | set(E)   | E         | absent   | no       |
//! | set(X)   | E         | set(E)   | no       |

use crate::notifications::dispatcher::notify_reaction;
use crate::orm::{post_reactions, posts};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult,
    Set, Statement, TransactionTrait,
};
use std::collections::HashMap;
use std::fmt;

/// Longest accepted emoji, in Unicode scalar values. Covers a base
/// character plus one variation selector, e.g. "❤️".
pub const MAX_EMOJI_CHARS: usize = 2;

/// Picker palette.
pub const AVAILABLE_EMOJIS: &[&str] = &[
    "👍", "❤️", "😂", "😮", "😢", "😠", "🤔", "🔥", "🎉", "🚀",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    Changed,
}

#[derive(Debug)]
pub enum ReactionError {
    InvalidEmoji,
    PostNotFound,
    Database(DbErr),
}

impl fmt::Display for ReactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmoji => f.write_str("invalid emoji"),
            Self::PostNotFound => f.write_str("post not found"),
            Self::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for ReactionError {}

impl From<DbErr> for ReactionError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

/// Trims and checks a submitted emoji.
pub fn validate_emoji(raw: &str) -> Result<&str, ReactionError> {
    let emoji = raw.trim();
    let len = emoji.chars().count();

    if len == 0 || len > MAX_EMOJI_CHARS {
        return Err(ReactionError::InvalidEmoji);
    }

    Ok(emoji)
}

/// True when `err` came from a UNIQUE or primary key constraint.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("UNIQUE constraint failed")
        || msg.contains("duplicate key value")
        || msg.contains("Duplicate entry")
}

/// Applies one toggle of `emoji` by `user_id` on `post_id`.
///
/// Runs as a single transaction. The insert is attempted first; a
/// uniqueness violation means a reaction already exists and the existing
/// row is removed or changed instead. Only a fresh insert notifies the
/// post's author.
pub async fn toggle_reaction(
    db: &DatabaseConnection,
    post_id: i32,
    user_id: i32,
    emoji: &str,
) -> Result<ToggleOutcome, ReactionError> {
    let emoji = validate_emoji(emoji)?;
    let txn = db.begin().await?;

    let post = posts::Entity::find_by_id(post_id)
        .one(&txn)
        .await?
        .ok_or(ReactionError::PostNotFound)?;

    let outcome = match insert_reaction(&txn, post_id, user_id, emoji).await {
        Ok(_) => {
            notify_reaction(&txn, &post, user_id).await?;
            ToggleOutcome::Added
        }
        Err(e) if is_unique_violation(&e) => {
            toggle_existing(&txn, &post, user_id, emoji).await?
        }
        Err(e) => return Err(e.into()),
    };

    txn.commit().await?;
    Ok(outcome)
}

/// Inserts inside a savepoint so a constraint failure leaves the outer
/// transaction usable.
async fn insert_reaction<C>(
    txn: &C,
    post_id: i32,
    user_id: i32,
    emoji: &str,
) -> Result<post_reactions::Model, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let savepoint = txn.begin().await?;

    let result = post_reactions::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id),
        emoji: Set(emoji.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&savepoint)
    .await;

    match result {
        Ok(model) => {
            savepoint.commit().await?;
            Ok(model)
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(e)
        }
    }
}

async fn toggle_existing<C: ConnectionTrait>(
    txn: &C,
    post: &posts::Model,
    user_id: i32,
    emoji: &str,
) -> Result<ToggleOutcome, DbErr> {
    let existing = post_reactions::Entity::find()
        .filter(post_reactions::Column::PostId.eq(post.id))
        .filter(post_reactions::Column::UserId.eq(user_id))
        .one(txn)
        .await?;

    let existing = match existing {
        Some(row) => row,
        // The conflicting row was deleted after our insert failed.
        None => {
            return Err(DbErr::Custom(format!(
                "reaction on post {} by user {} vanished during toggle",
                post.id, user_id
            )))
        }
    };

    if existing.emoji == emoji {
        post_reactions::Entity::delete_by_id(existing.id)
            .exec(txn)
            .await?;
        Ok(ToggleOutcome::Removed)
    } else {
        let mut active: post_reactions::ActiveModel = existing.into();
        active.emoji = Set(emoji.to_owned());
        active.update(txn).await?;
        Ok(ToggleOutcome::Changed)
    }
}

/// Current reaction of `user_id` on `post_id`, if any.
pub async fn get_user_reaction<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    user_id: i32,
) -> Result<Option<String>, DbErr> {
    Ok(post_reactions::Entity::find()
        .filter(post_reactions::Column::PostId.eq(post_id))
        .filter(post_reactions::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .map(|r| r.emoji))
}

/// One emoji bubble under a post.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionSummary {
    pub emoji: String,
    pub count: usize,
    pub usernames: Vec<String>,
}

impl ReactionSummary {
    /// Tooltip listing who reacted.
    pub fn usernames_joined(&self) -> String {
        self.usernames.join(", ")
    }
}

#[derive(Debug, FromQueryResult)]
struct ReactionRow {
    post_id: i32,
    emoji: String,
    username: String,
}

/// Reaction bubbles for each of `post_ids`, most popular first.
/// Posts without reactions are absent from the map.
pub async fn reactions_for_posts<C: ConnectionTrait>(
    db: &C,
    post_ids: &[i32],
) -> Result<HashMap<i32, Vec<ReactionSummary>>, DbErr> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; post_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT pr.post_id, pr.emoji, u.username
        FROM post_reactions pr
        JOIN users u ON pr.user_id = u.id
        WHERE pr.post_id IN ({})
        ORDER BY pr.created_at ASC, pr.id ASC
        "#,
        placeholders
    );
    let values: Vec<sea_orm::Value> = post_ids.iter().map(|id| (*id).into()).collect();

    let rows = ReactionRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        &sql,
        values,
    ))
    .all(db)
    .await?;

    Ok(group_reactions(rows))
}

fn group_reactions(rows: Vec<ReactionRow>) -> HashMap<i32, Vec<ReactionSummary>> {
    let mut grouped: HashMap<i32, Vec<ReactionSummary>> = HashMap::new();

    for row in rows {
        let summaries = grouped.entry(row.post_id).or_default();
        match summaries.iter_mut().find(|s| s.emoji == row.emoji) {
            Some(summary) => {
                summary.count += 1;
                summary.usernames.push(row.username);
            }
            None => summaries.push(ReactionSummary {
                emoji: row.emoji,
                count: 1,
                usernames: vec![row.username],
            }),
        }
    }

    // Stable: ties keep first-reacted order.
    for summaries in grouped.values_mut() {
        summaries.sort_by(|a, b| b.count.cmp(&a.count));
    }

    grouped
}

/// A reaction a user gave, for their profile page.
#[derive(Clone, Debug, FromQueryResult)]
pub struct GivenReaction {
    pub emoji: String,
    pub post_id: i32,
    pub topic_id: i32,
    pub topic_title: String,
    pub created_at: NaiveDateTime,
}

pub async fn reactions_given_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<GivenReaction>, DbErr> {
    let sql = r#"
        SELECT pr.emoji, pr.post_id, t.id AS topic_id, t.title AS topic_title, pr.created_at
        FROM post_reactions pr
        JOIN posts p ON pr.post_id = p.id
        JOIN topics t ON p.topic_id = t.id
        WHERE pr.user_id = ?
        ORDER BY pr.created_at DESC, pr.id DESC
    "#;

    GivenReaction::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        vec![user_id.into()],
    ))
    .all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_emoji() {
        assert_eq!("👍", validate_emoji(" 👍 ").unwrap());
        assert_eq!("❤️", validate_emoji("❤️").unwrap());
        assert!(matches!(validate_emoji(""), Err(ReactionError::InvalidEmoji)));
        assert!(matches!(validate_emoji("   "), Err(ReactionError::InvalidEmoji)));
        assert!(matches!(validate_emoji("abc"), Err(ReactionError::InvalidEmoji)));
        assert!(matches!(
            validate_emoji("<script>"),
            Err(ReactionError::InvalidEmoji)
        ));
    }

    #[test]
    fn test_palette_is_valid() {
        for emoji in AVAILABLE_EMOJIS {
            assert!(validate_emoji(emoji).is_ok(), "{} rejected", emoji);
        }
    }

    #[test]
    fn test_unique_violation_detection() {
        let sqlite = DbErr::Exec(
            "error returned from database: UNIQUE constraint failed: post_reactions.post_id, post_reactions.user_id"
                .to_owned(),
        );
        assert!(is_unique_violation(&sqlite));
        assert!(!is_unique_violation(&DbErr::Exec(
            "FOREIGN KEY constraint failed".to_owned()
        )));
    }

    #[test]
    fn test_group_reactions_orders_by_count() {
        let row = |post_id: i32, emoji: &str, username: &str| ReactionRow {
            post_id,
            emoji: emoji.to_owned(),
            username: username.to_owned(),
        };
        let grouped = group_reactions(vec![
            row(1, "🔥", "ann"),
            row(1, "👍", "bob"),
            row(1, "👍", "cat"),
            row(2, "😂", "ann"),
        ]);

        let first = &grouped[&1];
        assert_eq!(2, first.len());
        assert_eq!("👍", first[0].emoji);
        assert_eq!(2, first[0].count);
        assert_eq!("bob, cat", first[0].usernames_joined());
        assert_eq!("🔥", first[1].emoji);
        assert_eq!(1, grouped[&2].len());
    }
}
