//! Database pool and schema bootstrap.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Schema applied on start-up. Every statement is idempotent.
const SCHEMA: &str = include_str!("../migrations/schema.sql");

/// Returns the process-wide connection pool.
/// Panics if `init_db` has not completed.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL
        .get()
        .expect("Database pool accessed before init_db was called.")
}

/// Connects to `database_url`, applies the schema and stores the pool.
/// Panics on failure; the server cannot run without its database.
pub async fn init_db(database_url: String) {
    let db = connect(&database_url)
        .await
        .expect("Failed to connect to the database.");
    migrate(&db).await.expect("Failed to apply database schema.");

    if DB_POOL.set(db).is_err() {
        log::warn!("init_db called more than once; keeping the first pool.");
    }
}

/// Opens a pool for `database_url`.
///
/// In-memory SQLite databases live and die with a single connection, so the
/// pool is pinned to one connection for `sqlite::memory:` URLs.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(16);
    }

    Database::connect(opt).await
}

/// Applies `migrations/schema.sql`, one statement at a time.
pub async fn migrate<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    db.execute(Statement::from_string(
        backend,
        "PRAGMA foreign_keys = ON".to_owned(),
    ))
    .await?;

    for statement in schema_statements(SCHEMA) {
        db.execute(Statement::from_string(backend, statement.to_owned()))
            .await?;
    }

    log::debug!("Database schema is up to date.");
    Ok(())
}

/// Splits a schema file into statements, dropping `--` comment lines.
fn schema_statements(schema: &str) -> Vec<String> {
    let stripped: String = schema
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    stripped
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_split() {
        let statements = schema_statements(
            "-- users\nCREATE TABLE a (id INTEGER);\n\n-- idx\nCREATE INDEX b ON a (id);\n",
        );
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].starts_with("CREATE INDEX b"));
    }

    #[test]
    fn test_bundled_schema_has_all_tables() {
        let statements = schema_statements(SCHEMA);
        for table in [
            "users",
            "categories",
            "forums",
            "topics",
            "posts",
            "notifications",
            "post_reactions",
            "announcements",
            "private_messages",
        ] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} ", table);
            assert!(
                statements.iter().any(|s| s.starts_with(&needle)),
                "missing table {}",
                table
            );
        }
    }
}
