//! Notification triggers for new posts and reactions

use crate::bbcode::extract_quote_names;
use crate::notifications::{create_notification, NewNotification, NotificationKind};
use crate::orm::posts;
use crate::user::find_by_username;
use sea_orm::{ConnectionTrait, DbErr};

/// Notifies every user quoted by name in a new post body.
///
/// Names are deduplicated, unknown names are skipped, and the author is
/// never notified about quoting themselves. Returns the number of
/// notifications written.
pub async fn notify_quoted_users<C: ConnectionTrait>(
    db: &C,
    body: &str,
    author_id: i32,
    topic_id: i32,
    post_id: i32,
) -> Result<usize, DbErr> {
    let mut sent = 0;

    for name in extract_quote_names(body) {
        let quoted = match find_by_username(db, &name).await? {
            Some(user) => user,
            None => {
                log::debug!("notify_quoted_users: no user named {:?}", name);
                continue;
            }
        };

        let created = create_notification(
            db,
            NewNotification {
                user_id: quoted.id,
                actor_id: author_id,
                topic_id,
                post_id,
                kind: NotificationKind::Quote,
            },
        )
        .await?;

        if created.is_some() {
            sent += 1;
        }
    }

    Ok(sent)
}

/// Notifies a post's author about a first-time reaction.
/// Posts whose author was deleted produce nothing.
pub async fn notify_reaction<C: ConnectionTrait>(
    db: &C,
    post: &posts::Model,
    reactor_id: i32,
) -> Result<bool, DbErr> {
    let author_id = match post.user_id {
        Some(id) => id,
        None => return Ok(false),
    };

    let created = create_notification(
        db,
        NewNotification {
            user_id: author_id,
            actor_id: reactor_id,
            topic_id: post.topic_id,
            post_id: post.id,
            kind: NotificationKind::Reaction,
        },
    )
    .await?;

    Ok(created.is_some())
}
