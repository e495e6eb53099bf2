//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use liteforum::orm::{categories, forums, posts, topics, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub password: String, // Plain text password for testing
}

/// Create a member with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    create_test_user_with_role(db, username, password, "member").await
}

/// Create a user with the given role ("member", "moderator" or "admin")
pub async fn create_test_user_with_role(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<TestUser, DbErr> {
    let password_hash = liteforum::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let user = users::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(password_hash),
        display_name: Set(None),
        role: Set(role.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(TestUser {
        id: user.id,
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    title: &str,
) -> Result<categories::Model, DbErr> {
    categories::ActiveModel {
        title: Set(title.to_owned()),
        sort_order: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_forum(
    db: &DatabaseConnection,
    category_id: i32,
    title: &str,
) -> Result<forums::Model, DbErr> {
    forums::ActiveModel {
        category_id: Set(category_id),
        title: Set(title.to_owned()),
        description: Set(Some(format!("{} description", title))),
        sort_order: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// A category holding one forum
pub async fn create_test_board(db: &DatabaseConnection) -> Result<forums::Model, DbErr> {
    let category = create_test_category(db, "General").await?;
    create_test_forum(db, category.id, "Chatter").await
}

/// Topic with its opening post, inserted directly so no notifications fire
pub async fn create_test_topic(
    db: &DatabaseConnection,
    forum_id: i32,
    user_id: i32,
    title: &str,
) -> Result<(topics::Model, posts::Model), DbErr> {
    let topic = topics::ActiveModel {
        forum_id: Set(Some(forum_id)),
        user_id: Set(Some(user_id)),
        title: Set(title.to_owned()),
        is_global: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let post = create_test_post(db, topic.id, user_id, "Opening post").await?;
    Ok((topic, post))
}

/// Post inserted directly so no notifications fire
pub async fn create_test_post(
    db: &DatabaseConnection,
    topic_id: i32,
    user_id: i32,
    body: &str,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        topic_id: Set(topic_id),
        user_id: Set(Some(user_id)),
        body: Set(body.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
