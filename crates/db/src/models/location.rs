use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::values::{Description, LocationType, Name};

/// A place in the garden (a room, a balcony, a bed area) that hosts growing units.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Location {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location_type: LocationType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateLocation {
    pub name: String,
    pub location_type: LocationType,
    pub description: Option<String>,
}

/// Partial update. `description: null` clears it, an absent field leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub location_type: Option<LocationType>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub description: Option<Option<String>>,
}

/// Validated form of [`UpdateLocation`].
#[derive(Debug, Clone, Default)]
pub struct LocationChanges {
    pub name: Option<Name>,
    pub location_type: Option<LocationType>,
    pub description: Option<Description>,
}

impl Location {
    pub fn new(
        owner_id: Uuid,
        name: Name,
        location_type: LocationType,
        description: Description,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into_inner(),
            location_type,
            description: description.into_inner(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply validated changes, returning whether anything actually changed.
    pub fn apply(&mut self, changes: LocationChanges) -> bool {
        let mut changed = false;
        if let Some(name) = changes.name {
            let name = name.into_inner();
            if name != self.name {
                self.name = name;
                changed = true;
            }
        }
        if let Some(location_type) = changes.location_type {
            if location_type != self.location_type {
                self.location_type = location_type;
                changed = true;
            }
        }
        if let Some(description) = changes.description {
            let description = description.into_inner();
            if description != self.description {
                self.description = description;
                changed = true;
            }
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub async fn insert<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO locations (id, owner_id, name, location_type, description, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.name)
        .bind(self.location_type)
        .bind(&self.description)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn save<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE locations
               SET name = $3, location_type = $4, description = $5, updated_at = $6
               WHERE id = $1 AND owner_id = $2"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.name)
        .bind(self.location_type)
        .bind(&self.description)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Location>(
            r#"SELECT id, owner_id, name, location_type, description, created_at, updated_at
               FROM locations
               WHERE id = $1 AND owner_id = $2"#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await
    }

    /// All locations of one owner, or of every owner when `owner_id` is `None`.
    pub async fn find_all(
        pool: &SqlitePool,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"SELECT id, owner_id, name, location_type, description, created_at, updated_at
               FROM locations
               WHERE $1 IS NULL OR owner_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
