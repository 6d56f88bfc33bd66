use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::values::{
    DaysToMaturity, Description, GrowthRate, Name, PhRange, PlantCategory, ScientificName,
    SunRequirement, TemperatureRange, WaterRequirement,
};

/// Catalogue entry describing how a kind of plant likes to be grown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PlantSpecies {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub common_name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub category: PlantCategory,
    pub growth_rate: GrowthRate,
    pub sun_requirement: SunRequirement,
    pub water_requirement: WaterRequirement,
    pub ph_range: Option<PhRange>,
    pub temperature_range: Option<TemperatureRange>,
    pub days_to_maturity: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PlantSpeciesRow {
    id: Uuid,
    owner_id: Uuid,
    common_name: String,
    scientific_name: String,
    family: Option<String>,
    category: PlantCategory,
    growth_rate: GrowthRate,
    sun_requirement: SunRequirement,
    water_requirement: WaterRequirement,
    ph_min: Option<f64>,
    ph_max: Option<f64>,
    temperature_min: Option<f64>,
    temperature_max: Option<f64>,
    days_to_maturity: Option<i64>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlantSpeciesRow> for PlantSpecies {
    fn from(row: PlantSpeciesRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            common_name: row.common_name,
            scientific_name: row.scientific_name,
            family: row.family,
            category: row.category,
            growth_rate: row.growth_rate,
            sun_requirement: row.sun_requirement,
            water_requirement: row.water_requirement,
            ph_range: row
                .ph_min
                .zip(row.ph_max)
                .map(|(min, max)| PhRange { min, max }),
            temperature_range: row
                .temperature_min
                .zip(row.temperature_max)
                .map(|(min, max)| TemperatureRange { min, max }),
            days_to_maturity: row.days_to_maturity,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Unicode-lowercased form used for per-owner uniqueness of scientific names.
pub fn scientific_name_key(scientific_name: &str) -> String {
    scientific_name.to_lowercase()
}

const SELECT_COLUMNS: &str = "SELECT id, owner_id, common_name, scientific_name, family, category, growth_rate, sun_requirement, water_requirement, ph_min, ph_max, temperature_min, temperature_max, days_to_maturity, description, created_at, updated_at FROM plant_species";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
pub struct RangeInput {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePlantSpecies {
    pub common_name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub category: PlantCategory,
    pub growth_rate: Option<GrowthRate>,
    pub sun_requirement: Option<SunRequirement>,
    pub water_requirement: Option<WaterRequirement>,
    pub ph_range: Option<RangeInput>,
    pub temperature_range: Option<RangeInput>,
    pub days_to_maturity: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePlantSpecies {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub family: Option<Option<String>>,
    pub category: Option<PlantCategory>,
    pub growth_rate: Option<GrowthRate>,
    pub sun_requirement: Option<SunRequirement>,
    pub water_requirement: Option<WaterRequirement>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "RangeInput | null")]
    pub ph_range: Option<Option<RangeInput>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "RangeInput | null")]
    pub temperature_range: Option<Option<RangeInput>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number | null")]
    pub days_to_maturity: Option<Option<i64>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    pub description: Option<Option<String>>,
}

/// Validated fields of a new species.
#[derive(Debug, Clone)]
pub struct NewPlantSpecies {
    pub common_name: Name,
    pub scientific_name: ScientificName,
    pub family: Option<Name>,
    pub category: PlantCategory,
    pub growth_rate: GrowthRate,
    pub sun_requirement: SunRequirement,
    pub water_requirement: WaterRequirement,
    pub ph_range: Option<PhRange>,
    pub temperature_range: Option<TemperatureRange>,
    pub days_to_maturity: Option<DaysToMaturity>,
    pub description: Description,
}

#[derive(Debug, Clone, Default)]
pub struct PlantSpeciesChanges {
    pub common_name: Option<Name>,
    pub scientific_name: Option<ScientificName>,
    pub family: Option<Option<Name>>,
    pub category: Option<PlantCategory>,
    pub growth_rate: Option<GrowthRate>,
    pub sun_requirement: Option<SunRequirement>,
    pub water_requirement: Option<WaterRequirement>,
    pub ph_range: Option<Option<PhRange>>,
    pub temperature_range: Option<Option<TemperatureRange>>,
    pub days_to_maturity: Option<Option<DaysToMaturity>>,
    pub description: Option<Description>,
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: Option<T>, changed: &mut bool) {
    if let Some(value) = value {
        if *slot != value {
            *slot = value;
            *changed = true;
        }
    }
}

impl PlantSpecies {
    pub fn new(owner_id: Uuid, data: NewPlantSpecies) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            common_name: data.common_name.into_inner(),
            scientific_name: data.scientific_name.into_inner(),
            family: data.family.map(Name::into_inner),
            category: data.category,
            growth_rate: data.growth_rate,
            sun_requirement: data.sun_requirement,
            water_requirement: data.water_requirement,
            ph_range: data.ph_range,
            temperature_range: data.temperature_range,
            days_to_maturity: data.days_to_maturity.map(DaysToMaturity::value),
            description: data.description.into_inner(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: PlantSpeciesChanges) -> bool {
        let mut changed = false;
        set_if_changed(
            &mut self.common_name,
            changes.common_name.map(Name::into_inner),
            &mut changed,
        );
        set_if_changed(
            &mut self.scientific_name,
            changes.scientific_name.map(ScientificName::into_inner),
            &mut changed,
        );
        set_if_changed(
            &mut self.family,
            changes.family.map(|family| family.map(Name::into_inner)),
            &mut changed,
        );
        set_if_changed(&mut self.category, changes.category, &mut changed);
        set_if_changed(&mut self.growth_rate, changes.growth_rate, &mut changed);
        set_if_changed(&mut self.sun_requirement, changes.sun_requirement, &mut changed);
        set_if_changed(&mut self.water_requirement, changes.water_requirement, &mut changed);
        set_if_changed(&mut self.ph_range, changes.ph_range, &mut changed);
        set_if_changed(&mut self.temperature_range, changes.temperature_range, &mut changed);
        set_if_changed(
            &mut self.days_to_maturity,
            changes
                .days_to_maturity
                .map(|days| days.map(DaysToMaturity::value)),
            &mut changed,
        );
        set_if_changed(
            &mut self.description,
            changes.description.map(Description::into_inner),
            &mut changed,
        );
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
            r#"INSERT INTO plant_species (id, owner_id, common_name, scientific_name, family, category, growth_rate,
                                          sun_requirement, water_requirement, ph_min, ph_max, temperature_min,
                                          temperature_max, days_to_maturity, description, created_at, updated_at,
                                          scientific_name_key)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.common_name)
        .bind(&self.scientific_name)
        .bind(&self.family)
        .bind(self.category)
        .bind(self.growth_rate)
        .bind(self.sun_requirement)
        .bind(self.water_requirement)
        .bind(self.ph_range.map(|r| r.min))
        .bind(self.ph_range.map(|r| r.max))
        .bind(self.temperature_range.map(|r| r.min))
        .bind(self.temperature_range.map(|r| r.max))
        .bind(self.days_to_maturity)
        .bind(&self.description)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(scientific_name_key(&self.scientific_name))
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn save<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE plant_species
               SET common_name = $3, scientific_name = $4, family = $5, category = $6, growth_rate = $7,
                   sun_requirement = $8, water_requirement = $9, ph_min = $10, ph_max = $11,
                   temperature_min = $12, temperature_max = $13, days_to_maturity = $14,
                   description = $15, updated_at = $16, scientific_name_key = $17
               WHERE id = $1 AND owner_id = $2"#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.common_name)
        .bind(&self.scientific_name)
        .bind(&self.family)
        .bind(self.category)
        .bind(self.growth_rate)
        .bind(self.sun_requirement)
        .bind(self.water_requirement)
        .bind(self.ph_range.map(|r| r.min))
        .bind(self.ph_range.map(|r| r.max))
        .bind(self.temperature_range.map(|r| r.min))
        .bind(self.temperature_range.map(|r| r.max))
        .bind(self.days_to_maturity)
        .bind(&self.description)
        .bind(self.updated_at)
        .bind(scientific_name_key(&self.scientific_name))
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
        let row = sqlx::query_as::<_, PlantSpeciesRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(PlantSpecies::from))
    }

    /// Case-insensitive lookup through the lowercased key column.
    pub async fn find_by_scientific_name<'e, E>(
        executor: E,
        owner_id: Uuid,
        scientific_name: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, PlantSpeciesRow>(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = $1 AND scientific_name_key = $2"
        ))
        .bind(owner_id)
        .bind(scientific_name_key(scientific_name))
        .fetch_optional(executor)
        .await?;
        Ok(row.map(PlantSpecies::from))
    }

    pub async fn find_all(
        pool: &SqlitePool,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PlantSpeciesRow>(&format!(
            "{SELECT_COLUMNS} WHERE $1 IS NULL OR owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(PlantSpecies::from).collect())
    }

    pub async fn delete<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM plant_species WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
