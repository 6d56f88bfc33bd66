//! The per-owner species catalogue.

use chrono::{DateTime, Utc};
use db::{
    models::{
        plant::Plant,
        plant_species::{
            CreatePlantSpecies, NewPlantSpecies, PlantSpecies, PlantSpeciesChanges, RangeInput,
            UpdatePlantSpecies,
        },
        values::{
            DaysToMaturity, Description, Name, PhRange, PlantCategory, ScientificName,
            SunRequirement, TemperatureRange, ValueError,
        },
        views::PlantSpeciesView,
    },
    read_store::{Collection, ReadStoreError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    context::ServiceContext,
    events::DomainEvent,
    query::{ListParams, Paginated, Sortable, name_matches, parse_filter},
};

#[derive(Debug, Error)]
pub enum PlantSpeciesError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("read store error: {0}")]
    ReadStore(#[from] ReadStoreError),
    #[error(transparent)]
    Validation(#[from] ValueError),
    #[error("plant species {0} not found")]
    NotFound(Uuid),
    #[error("a species named '{0}' already exists")]
    DuplicateScientificName(String),
    #[error("plant species {id} is used by {plants} plant(s)")]
    InUse { id: Uuid, plants: i64 },
}

impl From<sqlx::Error> for PlantSpeciesError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PlantSpeciesFilter {
    pub category: Option<String>,
    pub sun_requirement: Option<String>,
    /// Matches either the common or the scientific name.
    pub name: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Sortable for PlantSpeciesView {
    fn sort_name(&self) -> &str {
        &self.common_name
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn ph_range(input: RangeInput) -> Result<PhRange, ValueError> {
    PhRange::new(input.min, input.max)
}

fn temperature_range(input: RangeInput) -> Result<TemperatureRange, ValueError> {
    TemperatureRange::new(input.min, input.max)
}

fn family(raw: &str) -> Result<Name, ValueError> {
    Name::for_field("family", raw)
}

/// Map a unique-index violation on `(owner_id, scientific_name)` to a
/// domain error; a concurrent insert can slip past the lookup.
fn unique_violation(err: sqlx::Error, scientific_name: &str) -> PlantSpeciesError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PlantSpeciesError::DuplicateScientificName(scientific_name.to_string())
        }
        _ => PlantSpeciesError::Database(err),
    }
}

#[derive(Clone)]
pub struct PlantSpeciesService {
    ctx: ServiceContext,
}

impl PlantSpeciesService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        data: CreatePlantSpecies,
    ) -> Result<PlantSpecies, PlantSpeciesError> {
        let validated = NewPlantSpecies {
            common_name: Name::for_field("common_name", &data.common_name)?,
            scientific_name: ScientificName::new(&data.scientific_name)?,
            family: data
                .family
                .as_deref()
                .filter(|f| !f.trim().is_empty())
                .map(family)
                .transpose()?,
            category: data.category,
            growth_rate: data.growth_rate.unwrap_or_default(),
            sun_requirement: data.sun_requirement.unwrap_or_default(),
            water_requirement: data.water_requirement.unwrap_or_default(),
            ph_range: data.ph_range.map(ph_range).transpose()?,
            temperature_range: data.temperature_range.map(temperature_range).transpose()?,
            days_to_maturity: data.days_to_maturity.map(DaysToMaturity::new).transpose()?,
            description: Description::new(data.description.as_deref())?,
        };

        let scientific_name = validated.scientific_name.as_str().to_string();
        if PlantSpecies::find_by_scientific_name(self.ctx.pool(), owner_id, &scientific_name)
            .await?
            .is_some()
        {
            return Err(PlantSpeciesError::DuplicateScientificName(scientific_name));
        }

        let species = PlantSpecies::new(owner_id, validated);
        species
            .insert(self.ctx.pool())
            .await
            .map_err(|e| unique_violation(e, &scientific_name))?;

        info!(species_id = %species.id, scientific_name = %species.scientific_name, "Plant species created");
        self.ctx.events.publish(DomainEvent::PlantSpeciesCreated {
            owner_id,
            species_id: species.id,
            occurred_at: species.created_at,
        });
        Ok(species)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdatePlantSpecies,
    ) -> Result<PlantSpecies, PlantSpeciesError> {
        let changes = PlantSpeciesChanges {
            common_name: data
                .common_name
                .as_deref()
                .map(|n| Name::for_field("common_name", n))
                .transpose()?,
            scientific_name: data
                .scientific_name
                .as_deref()
                .map(ScientificName::new)
                .transpose()?,
            family: data
                .family
                .map(|f| {
                    f.as_deref()
                        .filter(|f| !f.trim().is_empty())
                        .map(family)
                        .transpose()
                })
                .transpose()?,
            category: data.category,
            growth_rate: data.growth_rate,
            sun_requirement: data.sun_requirement,
            water_requirement: data.water_requirement,
            ph_range: data
                .ph_range
                .map(|r| r.map(ph_range).transpose())
                .transpose()?,
            temperature_range: data
                .temperature_range
                .map(|r| r.map(temperature_range).transpose())
                .transpose()?,
            days_to_maturity: data
                .days_to_maturity
                .map(|d| d.map(DaysToMaturity::new).transpose())
                .transpose()?,
            description: data
                .description
                .map(|d| Description::new(d.as_deref()))
                .transpose()?,
        };

        let mut species = PlantSpecies::find_by_id(self.ctx.pool(), owner_id, id)
            .await?
            .ok_or(PlantSpeciesError::NotFound(id))?;

        if let Some(name) = &changes.scientific_name {
            let clash =
                PlantSpecies::find_by_scientific_name(self.ctx.pool(), owner_id, name.as_str())
                    .await?;
            if clash.is_some_and(|other| other.id != id) {
                return Err(PlantSpeciesError::DuplicateScientificName(
                    name.as_str().to_string(),
                ));
            }
        }

        if !species.apply(changes) {
            return Ok(species);
        }
        species
            .save(self.ctx.pool())
            .await
            .map_err(|e| unique_violation(e, &species.scientific_name))?;

        self.ctx.events.publish(DomainEvent::PlantSpeciesUpdated {
            owner_id,
            species_id: id,
            occurred_at: species.updated_at,
        });
        Ok(species)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), PlantSpeciesError> {
        let mut tx = self.ctx.pool().begin().await?;
        PlantSpecies::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(PlantSpeciesError::NotFound(id))?;

        let plants = Plant::count_by_species_id(&mut *tx, id).await?;
        if plants > 0 {
            return Err(PlantSpeciesError::InUse { id, plants });
        }
        PlantSpecies::delete(&mut *tx, owner_id, id).await?;
        tx.commit().await?;

        info!(species_id = %id, "Plant species deleted");
        self.ctx.events.publish(DomainEvent::PlantSpeciesDeleted {
            owner_id,
            species_id: id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn find(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<PlantSpeciesView, PlantSpeciesError> {
        self.ctx
            .read_store
            .get(Collection::PlantSpecies, owner_id, id)
            .await?
            .ok_or(PlantSpeciesError::NotFound(id))
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &PlantSpeciesFilter,
    ) -> Result<Paginated<PlantSpeciesView>, PlantSpeciesError> {
        let listing = ListParams {
            sort_by: filter.sort_by.as_deref(),
            direction: filter.direction.as_deref(),
            page: filter.page,
            per_page: filter.per_page,
        }
        .resolve(self.ctx.pagination)?;
        let category: Option<PlantCategory> =
            parse_filter("category", filter.category.as_deref())?;
        let sun: Option<SunRequirement> =
            parse_filter("sun_requirement", filter.sun_requirement.as_deref())?;

        let views: Vec<PlantSpeciesView> = self
            .ctx
            .read_store
            .list(Collection::PlantSpecies, owner_id)
            .await?;
        let needle = filter.name.as_deref();
        let matching = views
            .into_iter()
            .filter(|v| category.is_none_or(|c| v.category == c))
            .filter(|v| sun.is_none_or(|s| v.sun_requirement == s))
            .filter(|v| name_matches(&v.common_name, needle) || name_matches(&v.scientific_name, needle))
            .collect();

        Ok(listing.apply(matching))
    }
}
