//! Document store backing the query side.
//!
//! View models are kept as JSON documents keyed by `(collection, id)` in a
//! database of their own, so the read side can be dropped and rebuilt from the
//! write store at any time.

use std::path::Path;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{DbError, open_file_pool, open_memory_pool};

#[derive(Debug, Error)]
pub enum ReadStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The collections a view model can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Locations,
    GrowingUnits,
    Plants,
    PlantSpecies,
}

#[derive(Clone)]
pub struct ReadStore {
    pool: SqlitePool,
}

impl ReadStore {
    pub async fn new(path: &Path) -> Result<ReadStore, DbError> {
        let pool = open_file_pool(path).await?;
        sqlx::migrate!("./read_migrations").run(&pool).await?;
        info!(path = %path.display(), "Read database ready");
        Ok(ReadStore { pool })
    }

    pub async fn new_in_memory() -> Result<ReadStore, DbError> {
        let pool = open_memory_pool().await?;
        sqlx::migrate!("./read_migrations").run(&pool).await?;
        Ok(ReadStore { pool })
    }

    pub async fn upsert<T: Serialize>(
        &self,
        collection: Collection,
        id: Uuid,
        owner_id: Uuid,
        document: &T,
    ) -> Result<(), ReadStoreError> {
        let json = serde_json::to_string(document)?;
        sqlx::query(
            r#"INSERT INTO view_documents (collection, id, owner_id, document, updated_at)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT(collection, id) DO UPDATE SET
                   owner_id = excluded.owner_id,
                   document = excluded.document,
                   updated_at = excluded.updated_at"#,
        )
        .bind(collection.to_string())
        .bind(id)
        .bind(owner_id)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a document, scoped to its owner. Documents of another owner are
    /// reported as absent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<T>, ReadStoreError> {
        let json: Option<String> = sqlx::query_scalar(
            "SELECT document FROM view_documents WHERE collection = $1 AND id = $2 AND owner_id = $3",
        )
        .bind(collection.to_string())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        json.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(ReadStoreError::from)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner_id: Uuid,
    ) -> Result<Vec<T>, ReadStoreError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT document FROM view_documents WHERE collection = $1 AND owner_id = $2",
        )
        .bind(collection.to_string())
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(ReadStoreError::from))
            .collect()
    }

    pub async fn delete(&self, collection: Collection, id: Uuid) -> Result<u64, ReadStoreError> {
        let result = sqlx::query("DELETE FROM view_documents WHERE collection = $1 AND id = $2")
            .bind(collection.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop every document of one owner, or of everyone when `owner_id` is `None`.
    pub async fn clear(&self, owner_id: Option<Uuid>) -> Result<u64, ReadStoreError> {
        let result = match owner_id {
            Some(owner_id) => {
                sqlx::query("DELETE FROM view_documents WHERE owner_id = $1")
                    .bind(owner_id)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM view_documents")
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    pub async fn count(&self, collection: Collection, owner_id: Uuid) -> Result<i64, ReadStoreError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM view_documents WHERE collection = $1 AND owner_id = $2",
        )
        .bind(collection.to_string())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
