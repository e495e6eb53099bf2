//! Integration tests for the post reaction toggle

mod common;

use common::{database::*, fixtures::*};
use liteforum::notifications::count_unread_notifications;
use liteforum::orm::{notifications as notification_orm, post_reactions};
use liteforum::reactions::{
    get_user_reaction, reactions_for_posts, reactions_given_by_user, toggle_reaction,
    ReactionError, ToggleOutcome,
};
use sea_orm::{entity::*, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

#[actix_rt::test]
async fn test_first_reaction_adds_and_notifies_author() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (topic, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    let outcome = toggle_reaction(&db, post.id, reactor.id, "👍").await.unwrap();
    assert_eq!(ToggleOutcome::Added, outcome);
    assert_eq!(
        Some("👍".to_owned()),
        get_user_reaction(&db, post.id, reactor.id).await.unwrap()
    );

    let notifications = notification_orm::Entity::find()
        .filter(notification_orm::Column::UserId.eq(author.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(1, notifications.len());
    assert_eq!("reaction", notifications[0].kind);
    assert_eq!(reactor.id, notifications[0].actor_id);
    assert_eq!(topic.id, notifications[0].topic_id);
    assert_eq!(post.id, notifications[0].post_id);
    assert!(!notifications[0].is_read);
}

#[actix_rt::test]
async fn test_same_emoji_twice_removes_without_notifying() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    toggle_reaction(&db, post.id, reactor.id, "🔥").await.unwrap();
    let outcome = toggle_reaction(&db, post.id, reactor.id, "🔥").await.unwrap();

    assert_eq!(ToggleOutcome::Removed, outcome);
    assert_eq!(None, get_user_reaction(&db, post.id, reactor.id).await.unwrap());
    assert_eq!(0, count_rows(&db, "post_reactions").await.unwrap());
    // Only the original add notified.
    assert_eq!(1, count_unread_notifications(&db, author.id).await.unwrap());
}

#[actix_rt::test]
async fn test_different_emoji_changes_in_place() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    toggle_reaction(&db, post.id, reactor.id, "👍").await.unwrap();
    let first = post_reactions::Entity::find().one(&db).await.unwrap().unwrap();

    let outcome = toggle_reaction(&db, post.id, reactor.id, "❤️").await.unwrap();
    assert_eq!(ToggleOutcome::Changed, outcome);

    let rows = post_reactions::Entity::find().all(&db).await.unwrap();
    assert_eq!(1, rows.len());
    assert_eq!(first.id, rows[0].id);
    assert_eq!("❤️", rows[0].emoji);
    assert_eq!(1, count_unread_notifications(&db, author.id).await.unwrap());
}

#[actix_rt::test]
async fn test_remove_then_add_again_notifies_again() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    toggle_reaction(&db, post.id, reactor.id, "😂").await.unwrap();
    toggle_reaction(&db, post.id, reactor.id, "😂").await.unwrap();
    let outcome = toggle_reaction(&db, post.id, reactor.id, "😂").await.unwrap();

    assert_eq!(ToggleOutcome::Added, outcome);
    assert_eq!(2, count_unread_notifications(&db, author.id).await.unwrap());
}

#[actix_rt::test]
async fn test_existing_row_is_found_through_unique_violation() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    // Written behind the toggle's back, as a concurrent request would.
    post_reactions::ActiveModel {
        post_id: Set(post.id),
        user_id: Set(reactor.id),
        emoji: Set("🤔".to_owned()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let outcome = toggle_reaction(&db, post.id, reactor.id, "🎉").await.unwrap();
    assert_eq!(ToggleOutcome::Changed, outcome);
    assert_eq!(
        Some("🎉".to_owned()),
        get_user_reaction(&db, post.id, reactor.id).await.unwrap()
    );
    assert_eq!(0, count_unread_notifications(&db, author.id).await.unwrap());
}

#[actix_rt::test]
async fn test_failed_notification_rolls_back_reaction() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();
    drop_table(&db, "notifications").await.unwrap();

    let result = toggle_reaction(&db, post.id, reactor.id, "👍").await;
    assert!(matches!(result, Err(ReactionError::Database(_))));

    assert_eq!(0, count_rows(&db, "post_reactions").await.unwrap());
    assert_eq!(None, get_user_reaction(&db, post.id, reactor.id).await.unwrap());
}

#[actix_rt::test]
async fn test_reacting_to_own_post_does_not_notify() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    let outcome = toggle_reaction(&db, post.id, author.id, "👍").await.unwrap();
    assert_eq!(ToggleOutcome::Added, outcome);
    assert_eq!(0, count_rows(&db, "notifications").await.unwrap());
}

#[actix_rt::test]
async fn test_reacting_to_orphaned_post_does_not_notify() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    liteforum::orm::users::Entity::delete_by_id(author.id)
        .exec(&db)
        .await
        .unwrap();

    let outcome = toggle_reaction(&db, post.id, reactor.id, "👍").await.unwrap();
    assert_eq!(ToggleOutcome::Added, outcome);
    assert_eq!(0, count_rows(&db, "notifications").await.unwrap());
}

#[actix_rt::test]
async fn test_invalid_input_is_rejected() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let reactor = create_test_user(&db, "reactor", "password123").await.unwrap();
    let (_, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();

    assert!(matches!(
        toggle_reaction(&db, post.id, reactor.id, "   ").await,
        Err(ReactionError::InvalidEmoji)
    ));
    assert!(matches!(
        toggle_reaction(&db, post.id, reactor.id, "lol").await,
        Err(ReactionError::InvalidEmoji)
    ));
    assert!(matches!(
        toggle_reaction(&db, post.id + 100, reactor.id, "👍").await,
        Err(ReactionError::PostNotFound)
    ));
    assert_eq!(0, count_rows(&db, "post_reactions").await.unwrap());
}

#[actix_rt::test]
async fn test_reaction_summaries_and_profile_list() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let author = create_test_user(&db, "author", "password123").await.unwrap();
    let ann = create_test_user(&db, "ann", "password123").await.unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();
    let cat = create_test_user(&db, "cat", "password123").await.unwrap();
    let (topic, post) = create_test_topic(&db, forum.id, author.id, "Hello").await.unwrap();
    let quiet = create_test_post(&db, topic.id, author.id, "Nobody reacts").await.unwrap();

    toggle_reaction(&db, post.id, ann.id, "🔥").await.unwrap();
    toggle_reaction(&db, post.id, bob.id, "👍").await.unwrap();
    toggle_reaction(&db, post.id, cat.id, "👍").await.unwrap();

    let summaries = reactions_for_posts(&db, &[post.id, quiet.id]).await.unwrap();
    assert!(!summaries.contains_key(&quiet.id));

    let bubbles = &summaries[&post.id];
    assert_eq!(2, bubbles.len());
    assert_eq!("👍", bubbles[0].emoji);
    assert_eq!(2, bubbles[0].count);
    assert_eq!(vec!["bob", "cat"], bubbles[0].usernames);
    assert_eq!("🔥", bubbles[1].emoji);

    let given = reactions_given_by_user(&db, ann.id).await.unwrap();
    assert_eq!(1, given.len());
    assert_eq!("🔥", given[0].emoji);
    assert_eq!(topic.id, given[0].topic_id);
    assert_eq!("Hello", given[0].topic_title);

    assert!(reactions_for_posts(&db, &[]).await.unwrap().is_empty());
}
