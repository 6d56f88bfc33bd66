use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::values::{Name, Notes, PlantStatus, PlantedDate};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Plant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub growing_unit_id: Uuid,
    pub species_id: Option<Uuid>,
    pub name: String,
    pub status: PlantStatus,
    pub planted_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePlant {
    pub growing_unit_id: Uuid,
    pub name: String,
    pub species_id: Option<Uuid>,
    pub status: Option<PlantStatus>,
    pub planted_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePlant {
    pub name: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub species_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub planted_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChangePlantStatus {
    pub status: PlantStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TransplantPlant {
    pub target_growing_unit_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct PlantChanges {
    pub name: Option<Name>,
    pub species_id: Option<Option<Uuid>>,
    pub planted_date: Option<Option<PlantedDate>>,
    pub notes: Option<Notes>,
}

const SELECT_COLUMNS: &str = "SELECT id, owner_id, growing_unit_id, species_id, name, status, planted_date, notes, created_at, updated_at FROM plants";

impl Plant {
    pub fn new(
        owner_id: Uuid,
        growing_unit_id: Uuid,
        name: Name,
        species_id: Option<Uuid>,
        status: PlantStatus,
        planted_date: Option<PlantedDate>,
        notes: Notes,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            growing_unit_id,
            species_id,
            name: name.into_inner(),
            status,
            planted_date: planted_date.map(PlantedDate::value),
            notes: notes.into_inner(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: PlantChanges) -> bool {
        let mut changed = false;
        if let Some(name) = changes.name {
            let name = name.into_inner();
            if name != self.name {
                self.name = name;
                changed = true;
            }
        }
        if let Some(species_id) = changes.species_id {
            if species_id != self.species_id {
                self.species_id = species_id;
                changed = true;
            }
        }
        if let Some(planted_date) = changes.planted_date {
            let planted_date = planted_date.map(PlantedDate::value);
            if planted_date != self.planted_date {
                self.planted_date = planted_date;
                changed = true;
            }
        }
        if let Some(notes) = changes.notes {
            let notes = notes.into_inner();
            if notes != self.notes {
                self.notes = notes;
                changed = true;
            }
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    /// Set a new status, returning the previous one when it differs.
    pub fn change_status(&mut self, status: PlantStatus) -> Option<PlantStatus> {
        if status == self.status {
            return None;
        }
        let previous = std::mem::replace(&mut self.status, status);
        self.updated_at = Utc::now();
        Some(previous)
    }

    /// Move the plant to another growing unit, returning the one it left.
    pub fn transplant_to(&mut self, growing_unit_id: Uuid) -> Uuid {
        let previous = std::mem::replace(&mut self.growing_unit_id, growing_unit_id);
        self.updated_at = Utc::now();
        previous
    }

    pub async fn insert<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO plants (id, owner_id, growing_unit_id, species_id, name, status, planted_date, notes, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(self.growing_unit_id)
        .bind(self.species_id)
        .bind(&self.name)
        .bind(self.status)
        .bind(self.planted_date)
        .bind(&self.notes)
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
            r#"UPDATE plants
               SET growing_unit_id = $3, species_id = $4, name = $5, status = $6,
                   planted_date = $7, notes = $8, updated_at = $9
               WHERE id = $1 AND owner_id = $2"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(self.growing_unit_id)
        .bind(self.species_id)
        .bind(&self.name)
        .bind(self.status)
        .bind(self.planted_date)
        .bind(&self.notes)
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
        sqlx::query_as::<_, Plant>(&format!("{SELECT_COLUMNS} WHERE id = $1 AND owner_id = $2"))
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_growing_unit_id(
        pool: &SqlitePool,
        growing_unit_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plant>(&format!(
            "{SELECT_COLUMNS} WHERE growing_unit_id = $1 ORDER BY created_at ASC"
        ))
        .bind(growing_unit_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_species_id(
        pool: &SqlitePool,
        species_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plant>(&format!(
            "{SELECT_COLUMNS} WHERE species_id = $1 ORDER BY created_at ASC"
        ))
        .bind(species_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_location_id(
        pool: &SqlitePool,
        location_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plant>(
            r#"SELECT p.id, p.owner_id, p.growing_unit_id, p.species_id, p.name, p.status,
                      p.planted_date, p.notes, p.created_at, p.updated_at
               FROM plants p
               JOIN growing_units g ON g.id = p.growing_unit_id
               WHERE g.location_id = $1
               ORDER BY p.created_at ASC"#,
        )
        .bind(location_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_all(
        pool: &SqlitePool,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plant>(&format!(
            "{SELECT_COLUMNS} WHERE $1 IS NULL OR owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_growing_unit_id<'e, E>(
        executor: E,
        growing_unit_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM plants WHERE growing_unit_id = $1")
            .bind(growing_unit_id)
            .fetch_one(executor)
            .await
    }

    pub async fn count_by_species_id<'e, E>(executor: E, species_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM plants WHERE species_id = $1")
            .bind(species_id)
            .fetch_one(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> Plant {
        Plant::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Name::new("Basil").unwrap(),
            None,
            PlantStatus::Planted,
            None,
            Notes::default(),
        )
    }

    #[test]
    fn status_change_to_same_value_is_a_no_op() {
        let mut plant = plant();
        assert_eq!(plant.change_status(PlantStatus::Planted), None);
        assert_eq!(
            plant.change_status(PlantStatus::Flowering),
            Some(PlantStatus::Planted)
        );
        assert_eq!(plant.status, PlantStatus::Flowering);
    }

    #[test]
    fn transplant_returns_the_previous_unit() {
        let mut plant = plant();
        let original = plant.growing_unit_id;
        let target = Uuid::new_v4();
        assert_eq!(plant.transplant_to(target), original);
        assert_eq!(plant.growing_unit_id, target);
    }

    #[test]
    fn clearing_notes_counts_as_a_change() {
        let mut plant = plant();
        plant.notes = Some("water daily".into());
        assert!(plant.apply(PlantChanges {
            notes: Some(Notes::new(None).unwrap()),
            ..Default::default()
        }));
        assert!(plant.notes.is_none());
    }
}
