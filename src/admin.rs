//! Board administration: categories, forums, users and announcements.
//!
//! Request-driven callers must check `ClientCtx::require_admin` first.

use crate::orm::{announcements, categories, forums, users};
use crate::user::Role;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr};

fn not_found(what: &str, id: i32) -> DbErr {
    DbErr::Custom(format!("{} {} not found", what, id))
}

pub async fn create_category<C: ConnectionTrait>(
    db: &C,
    title: &str,
    sort_order: i32,
) -> Result<categories::Model, DbErr> {
    categories::ActiveModel {
        title: Set(title.trim().to_owned()),
        sort_order: Set(sort_order),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn update_category<C: ConnectionTrait>(
    db: &C,
    id: i32,
    title: &str,
    sort_order: i32,
) -> Result<categories::Model, DbErr> {
    let category = categories::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("category", id))?;

    let mut active: categories::ActiveModel = category.into();
    active.title = Set(title.trim().to_owned());
    active.sort_order = Set(sort_order);
    active.update(db).await
}

/// Deletes a category with its forums, topics and posts.
pub async fn delete_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    Ok(categories::Entity::delete_by_id(id)
        .exec(db)
        .await?
        .rows_affected)
}

pub async fn create_forum<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    title: &str,
    description: Option<&str>,
    sort_order: i32,
) -> Result<forums::Model, DbErr> {
    forums::ActiveModel {
        category_id: Set(category_id),
        title: Set(title.trim().to_owned()),
        description: Set(description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned)),
        sort_order: Set(sort_order),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn update_forum<C: ConnectionTrait>(
    db: &C,
    id: i32,
    category_id: i32,
    title: &str,
    description: Option<&str>,
    sort_order: i32,
) -> Result<forums::Model, DbErr> {
    let forum = forums::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("forum", id))?;

    let mut active: forums::ActiveModel = forum.into();
    active.category_id = Set(category_id);
    active.title = Set(title.trim().to_owned());
    active.description = Set(description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned));
    active.sort_order = Set(sort_order);
    active.update(db).await
}

pub async fn delete_forum<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    Ok(forums::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

/// All accounts, oldest first.
pub async fn list_users<C: ConnectionTrait>(db: &C) -> Result<Vec<users::Model>, DbErr> {
    users::Entity::find()
        .order_by_asc(users::Column::CreatedAt)
        .order_by_asc(users::Column::Id)
        .all(db)
        .await
}

/// Changes a user's role. Unknown role names are rejected.
pub async fn set_user_role<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    role: &str,
) -> Result<users::Model, DbErr> {
    let role = Role::parse(role).ok_or_else(|| DbErr::Custom(format!("invalid role {:?}", role)))?;

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("user", user_id))?;

    let mut active: users::ActiveModel = user.into();
    active.role = Set(role.as_str().to_owned());
    let user = active.update(db).await?;

    log::info!("set_user_role: user {} is now {}", user.id, role);
    Ok(user)
}

/// Deletes `target_id` on behalf of `actor_id`. Their topics and posts stay
/// behind without an author. Admins cannot delete themselves.
pub async fn delete_user<C: ConnectionTrait>(
    db: &C,
    actor_id: i32,
    target_id: i32,
) -> Result<u64, DbErr> {
    if actor_id == target_id {
        return Err(DbErr::Custom("cannot delete your own account".to_owned()));
    }

    let res = users::Entity::delete_by_id(target_id).exec(db).await?;
    if res.rows_affected > 0 {
        log::info!("delete_user: user {} deleted by {}", target_id, actor_id);
    }
    Ok(res.rows_affected)
}

pub async fn create_announcement<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
    title: &str,
    body: &str,
) -> Result<announcements::Model, DbErr> {
    announcements::ActiveModel {
        user_id: Set(author_id),
        title: Set(title.trim().to_owned()),
        body: Set(body.trim().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn update_announcement<C: ConnectionTrait>(
    db: &C,
    id: i32,
    title: &str,
    body: &str,
) -> Result<announcements::Model, DbErr> {
    let announcement = announcements::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found("announcement", id))?;

    let mut active: announcements::ActiveModel = announcement.into();
    active.title = Set(title.trim().to_owned());
    active.body = Set(body.trim().to_owned());
    active.update(db).await
}

pub async fn delete_announcement<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    Ok(announcements::Entity::delete_by_id(id)
        .exec(db)
        .await?
        .rows_affected)
}

/// Newest first.
pub async fn list_announcements<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<announcements::Model>, DbErr> {
    announcements::Entity::find()
        .order_by_desc(announcements::Column::CreatedAt)
        .order_by_desc(announcements::Column::Id)
        .all(db)
        .await
}

/// Shown at the top of the index.
pub async fn latest_announcement<C: ConnectionTrait>(
    db: &C,
) -> Result<Option<announcements::Model>, DbErr> {
    announcements::Entity::find()
        .order_by_desc(announcements::Column::CreatedAt)
        .order_by_desc(announcements::Column::Id)
        .one(db)
        .await
}
