use crate::orm::{topics, users};
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DbBackend, DbErr, FromQueryResult, PaginatorTrait,
    Statement,
};
use std::fmt;

/// Base URL fragment for resource.
pub static RESOURCE_URL: &str = "members";

/// Site-wide role. Stored as text in `users.role`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Moderators and admins may edit and delete other people's content.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A struct to hold all information for a user, including relational information.
#[derive(Clone, Debug, FromQueryResult)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub last_seen: Option<NaiveDateTime>,
    pub post_count: i64,
    pub topic_count: i64,
}

impl Profile {
    /// Returns a fully qualified user profile by id.
    pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Self>, DbErr> {
        let sql = r#"
            SELECT
                u.id,
                u.username AS name,
                u.display_name,
                u.role,
                u.created_at,
                u.last_seen,
                (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS post_count,
                (SELECT COUNT(*) FROM topics t WHERE t.user_id = u.id) AS topic_count
            FROM users u
            WHERE u.id = ?
        "#;

        Self::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            sql,
            vec![id.into()],
        ))
        .one(db)
        .await
    }

    /// Display name when set, username otherwise.
    pub fn display(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }

    /// Unknown role strings degrade to member.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Member)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role().is_staff()
    }

    pub fn get_url(&self) -> String {
        format!("/{}/{}", RESOURCE_URL, self.id)
    }
}

/// Exact, case-sensitive username lookup.
pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(name))
        .one(db)
        .await
}

pub async fn get_user_id_from_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<i32>, DbErr> {
    Ok(find_by_username(db, name).await?.map(|user| user.id))
}

/// Records activity for the online list.
pub async fn touch_last_seen<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), DbErr> {
    users::Entity::update_many()
        .col_expr(
            users::Column::LastSeen,
            sea_orm::sea_query::Expr::value(Utc::now().naive_utc()),
        )
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

#[derive(Clone, Debug, FromQueryResult)]
pub struct ActiveUser {
    pub id: i32,
    pub username: String,
}

/// Users seen within the last `window_seconds`, alphabetical.
pub async fn active_users<C: ConnectionTrait>(
    db: &C,
    window_seconds: u32,
) -> Result<Vec<ActiveUser>, DbErr> {
    let cutoff = Utc::now().naive_utc() - Duration::seconds(window_seconds as i64);

    users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .filter(users::Column::LastSeen.gt(cutoff))
        .order_by_asc(users::Column::Username)
        .into_model::<ActiveUser>()
        .all(db)
        .await
}

/// Board totals shown on the index.
#[derive(Clone, Debug)]
pub struct ForumStats {
    pub total_users: u64,
    pub total_topics: u64,
    pub newest_user: Option<users::Model>,
    pub latest_topic: Option<topics::Model>,
}

pub async fn forum_stats<C: ConnectionTrait>(db: &C) -> Result<ForumStats, DbErr> {
    let total_users = users::Entity::find().count(db).await? as u64;
    let total_topics = topics::Entity::find().count(db).await? as u64;

    let newest_user = users::Entity::find()
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id)
        .one(db)
        .await?;

    let latest_topic = crate::topics::latest_topic(db).await?;

    Ok(ForumStats {
        total_users,
        total_topics,
        newest_user,
        latest_topic,
    })
}
