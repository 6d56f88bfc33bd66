use std::{path::Path, str::FromStr};

use sqlx::{
    SqlitePool,
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use thiserror::Error;
use tracing::info;

pub mod models;
pub mod read_store;

pub use read_store::ReadStore;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] MigrateError),
}

/// Connection pool for the write side: the relational store every command
/// validates and persists against.
#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    pub async fn new(path: &Path) -> Result<DBService, DbError> {
        let pool = open_file_pool(path).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(path = %path.display(), "Write database ready");
        Ok(DBService { pool })
    }

    /// Single-connection in-memory database, used by tests and ephemeral runs.
    pub async fn new_in_memory() -> Result<DBService, DbError> {
        let pool = open_memory_pool().await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(DBService { pool })
    }
}

pub(crate) async fn open_file_pool(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
}

pub(crate) async fn open_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    // Every connection to `:memory:` is its own database, so the pool must
    // never open a second one.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_database_is_created_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garden.sqlite");
        let db = DBService::new(&path).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('locations', 'growing_units', 'plants', 'plant_species')",
        )
        .fetch_one(&db.pool)
        .await
        .unwrap();
        assert_eq!(tables, 4);
        assert!(path.exists());
    }
}
