//! Test database setup
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};

/// Fresh in-memory database with the schema applied.
///
/// Every call gets its own database, so tests never see each other's rows
/// and need no cleanup.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = liteforum::db::connect("sqlite::memory:").await?;
    liteforum::db::migrate(&db).await?;
    Ok(db)
}

/// Row count of `table`, for asserting on cascades.
pub async fn count_rows(db: &DatabaseConnection, table: &str) -> Result<i64, DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {}", table),
        ))
        .await?
        .ok_or_else(|| DbErr::Custom("COUNT returned no row".to_owned()))?;

    row.try_get("", "n")
}

/// Drops `table` so that writes to it fail.
pub async fn drop_table(db: &DatabaseConnection, table: &str) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    db.execute(Statement::from_string(
        db.get_database_backend(),
        format!("DROP TABLE {}", table),
    ))
    .await?;
    Ok(())
}
