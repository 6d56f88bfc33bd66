use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::values::{Capacity, DimensionUnit, Dimensions, GrowingUnitType, Name};

/// A container or bed that holds a bounded number of plants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GrowingUnit {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub unit_type: GrowingUnitType,
    pub capacity: i64,
    pub dimensions: Option<Dimensions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct GrowingUnitRow {
    id: Uuid,
    owner_id: Uuid,
    location_id: Uuid,
    name: String,
    unit_type: GrowingUnitType,
    capacity: i64,
    dim_length: Option<f64>,
    dim_width: Option<f64>,
    dim_height: Option<f64>,
    dim_unit: Option<DimensionUnit>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GrowingUnitRow> for GrowingUnit {
    fn from(row: GrowingUnitRow) -> Self {
        let dimensions = match (row.dim_length, row.dim_width, row.dim_height, row.dim_unit) {
            (Some(length), Some(width), Some(height), Some(unit)) => Some(Dimensions {
                length,
                width,
                height,
                unit,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            owner_id: row.owner_id,
            location_id: row.location_id,
            name: row.name,
            unit_type: row.unit_type,
            capacity: row.capacity,
            dimensions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, owner_id, location_id, name, unit_type, capacity, dim_length, dim_width, dim_height, dim_unit, created_at, updated_at FROM growing_units";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DimensionsInput {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: DimensionUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateGrowingUnit {
    pub location_id: Uuid,
    pub name: String,
    pub unit_type: GrowingUnitType,
    pub capacity: i64,
    pub dimensions: Option<DimensionsInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateGrowingUnit {
    pub name: Option<String>,
    pub unit_type: Option<GrowingUnitType>,
    pub capacity: Option<i64>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "DimensionsInput | null")]
    pub dimensions: Option<Option<DimensionsInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MoveGrowingUnit {
    pub location_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct GrowingUnitChanges {
    pub name: Option<Name>,
    pub unit_type: Option<GrowingUnitType>,
    pub capacity: Option<Capacity>,
    pub dimensions: Option<Option<Dimensions>>,
}

impl GrowingUnit {
    pub fn new(
        owner_id: Uuid,
        location_id: Uuid,
        name: Name,
        unit_type: GrowingUnitType,
        capacity: Capacity,
        dimensions: Option<Dimensions>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            location_id,
            name: name.into_inner(),
            unit_type,
            capacity: capacity.value(),
            dimensions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the unit to another location, returning the one it left.
    pub fn relocate(&mut self, location_id: Uuid) -> Uuid {
        let previous = std::mem::replace(&mut self.location_id, location_id);
        self.updated_at = Utc::now();
        previous
    }

    pub fn remaining_capacity(&self, occupied: i64) -> i64 {
        (self.capacity - occupied).max(0)
    }

    pub fn apply(&mut self, changes: GrowingUnitChanges) -> bool {
        let mut changed = false;
        if let Some(name) = changes.name {
            let name = name.into_inner();
            if name != self.name {
                self.name = name;
                changed = true;
            }
        }
        if let Some(unit_type) = changes.unit_type {
            if unit_type != self.unit_type {
                self.unit_type = unit_type;
                changed = true;
            }
        }
        if let Some(capacity) = changes.capacity {
            if capacity.value() != self.capacity {
                self.capacity = capacity.value();
                changed = true;
            }
        }
        if let Some(dimensions) = changes.dimensions {
            if dimensions != self.dimensions {
                self.dimensions = dimensions;
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
        let dims = self.dimensions;
        sqlx::query(
            r#"INSERT INTO growing_units (id, owner_id, location_id, name, unit_type, capacity, dim_length, dim_width, dim_height, dim_unit, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(self.location_id)
        .bind(&self.name)
        .bind(self.unit_type)
        .bind(self.capacity)
        .bind(dims.map(|d| d.length))
        .bind(dims.map(|d| d.width))
        .bind(dims.map(|d| d.height))
        .bind(dims.map(|d| d.unit))
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
        let dims = self.dimensions;
        sqlx::query(
            r#"UPDATE growing_units
               SET location_id = $3, name = $4, unit_type = $5, capacity = $6,
                   dim_length = $7, dim_width = $8, dim_height = $9, dim_unit = $10,
                   updated_at = $11
               WHERE id = $1 AND owner_id = $2"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(self.location_id)
        .bind(&self.name)
        .bind(self.unit_type)
        .bind(self.capacity)
        .bind(dims.map(|d| d.length))
        .bind(dims.map(|d| d.width))
        .bind(dims.map(|d| d.height))
        .bind(dims.map(|d| d.unit))
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
        let row = sqlx::query_as::<_, GrowingUnitRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(GrowingUnit::from))
    }

    pub async fn find_by_location_id(
        pool: &SqlitePool,
        location_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, GrowingUnitRow>(&format!(
            "{SELECT_COLUMNS} WHERE location_id = $1 ORDER BY created_at ASC"
        ))
        .bind(location_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(GrowingUnit::from).collect())
    }

    pub async fn find_all(
        pool: &SqlitePool,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, GrowingUnitRow>(&format!(
            "{SELECT_COLUMNS} WHERE $1 IS NULL OR owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(GrowingUnit::from).collect())
    }

    pub async fn count_by_location_id<'e, E>(executor: E, location_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM growing_units WHERE location_id = $1")
            .bind(location_id)
            .fetch_one(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM growing_units WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
