//! Integration tests for profiles, presence and board statistics

mod common;

use common::{database::*, fixtures::*};
use liteforum::orm::users;
use liteforum::topics::create_reply;
use liteforum::user::{active_users, forum_stats, touch_last_seen, Profile, Role};
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait};

#[actix_rt::test]
async fn test_profile_counts_and_role() {
    let db = setup_test_database().await.unwrap();
    let forum = create_test_board(&db).await.unwrap();
    let alice = create_test_user_with_role(&db, "alice", "password123", "moderator")
        .await
        .unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();
    let (topic, _) = create_test_topic(&db, forum.id, alice.id, "Mine").await.unwrap();
    create_reply(&db, topic.id, alice.id, "again").await.unwrap();
    create_reply(&db, topic.id, bob.id, "hi").await.unwrap();

    let profile = Profile::get_by_id(&db, alice.id)
        .await
        .unwrap()
        .expect("Profile should exist");

    assert_eq!("alice", profile.name);
    assert_eq!(2, profile.post_count);
    assert_eq!(1, profile.topic_count);
    assert_eq!(Role::Moderator, profile.role());
    assert!(profile.is_staff());
    assert!(!profile.is_admin());
    assert_eq!(format!("/members/{}", alice.id), profile.get_url());

    assert!(Profile::get_by_id(&db, 999).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_display_name_falls_back_to_username() {
    let db = setup_test_database().await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();

    let profile = Profile::get_by_id(&db, alice.id).await.unwrap().unwrap();
    assert_eq!("alice", profile.display());

    let model = users::Entity::find_by_id(alice.id).one(&db).await.unwrap().unwrap();
    let mut active: users::ActiveModel = model.into();
    active.display_name = Set(Some("Alice A.".to_owned()));
    active.update(&db).await.unwrap();

    let profile = Profile::get_by_id(&db, alice.id).await.unwrap().unwrap();
    assert_eq!("Alice A.", profile.display());
}

#[actix_rt::test]
async fn test_active_users_after_touch() {
    let db = setup_test_database().await.unwrap();
    let zed = create_test_user(&db, "zed", "password123").await.unwrap();
    let amy = create_test_user(&db, "amy", "password123").await.unwrap();
    create_test_user(&db, "idle", "password123").await.unwrap();

    assert!(active_users(&db, 300).await.unwrap().is_empty());

    touch_last_seen(&db, zed.id).await.unwrap();
    touch_last_seen(&db, amy.id).await.unwrap();

    let active = active_users(&db, 300).await.unwrap();
    let names: Vec<&str> = active.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(vec!["amy", "zed"], names);
}

#[actix_rt::test]
async fn test_forum_stats() {
    let db = setup_test_database().await.unwrap();

    let empty = forum_stats(&db).await.unwrap();
    assert_eq!(0, empty.total_users);
    assert!(empty.newest_user.is_none());
    assert!(empty.latest_topic.is_none());

    let forum = create_test_board(&db).await.unwrap();
    let alice = create_test_user(&db, "alice", "password123").await.unwrap();
    let bob = create_test_user(&db, "bob", "password123").await.unwrap();
    create_test_topic(&db, forum.id, alice.id, "First").await.unwrap();
    let (second, _) = create_test_topic(&db, forum.id, alice.id, "Second").await.unwrap();

    let stats = forum_stats(&db).await.unwrap();
    assert_eq!(2, stats.total_users);
    assert_eq!(2, stats.total_topics);
    assert_eq!(Some(bob.id), stats.newest_user.map(|u| u.id));
    assert_eq!(Some(second.id), stats.latest_topic.map(|t| t.id));
}
