//! Growing units and their capacity invariant.

use chrono::{DateTime, Utc};
use db::{
    models::{
        growing_unit::{
            CreateGrowingUnit, DimensionsInput, GrowingUnit, GrowingUnitChanges, MoveGrowingUnit,
            UpdateGrowingUnit,
        },
        location::Location,
        plant::Plant,
        values::{Capacity, Dimensions, GrowingUnitType, Name, ValueError},
        views::GrowingUnitView,
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
pub enum GrowingUnitError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("read store error: {0}")]
    ReadStore(#[from] ReadStoreError),
    #[error(transparent)]
    Validation(#[from] ValueError),
    #[error("growing unit {0} not found")]
    NotFound(Uuid),
    #[error("location {0} not found")]
    LocationNotFound(Uuid),
    #[error("growing unit {id} still holds {plants} plant(s)")]
    NotEmpty { id: Uuid, plants: i64 },
    #[error("capacity {capacity} is below the {plants} plant(s) already in the unit")]
    CapacityBelowOccupancy { capacity: i64, plants: i64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct GrowingUnitFilter {
    pub location_id: Option<Uuid>,
    pub unit_type: Option<String>,
    pub has_free_capacity: Option<bool>,
    pub name: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Sortable for GrowingUnitView {
    fn sort_name(&self) -> &str {
        &self.name
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_dimensions(input: &DimensionsInput) -> Result<Dimensions, ValueError> {
    Dimensions::new(input.length, input.width, input.height, input.unit)
}

#[derive(Clone)]
pub struct GrowingUnitService {
    ctx: ServiceContext,
}

impl GrowingUnitService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        data: CreateGrowingUnit,
    ) -> Result<GrowingUnit, GrowingUnitError> {
        let name = Name::new(&data.name)?;
        let capacity = Capacity::new(data.capacity)?;
        let dimensions = data
            .dimensions
            .as_ref()
            .map(validate_dimensions)
            .transpose()?;

        Location::find_by_id(self.ctx.pool(), owner_id, data.location_id)
            .await?
            .ok_or(GrowingUnitError::LocationNotFound(data.location_id))?;

        let unit = GrowingUnit::new(
            owner_id,
            data.location_id,
            name,
            data.unit_type,
            capacity,
            dimensions,
        );
        unit.insert(self.ctx.pool()).await?;

        info!(
            growing_unit_id = %unit.id,
            location_id = %unit.location_id,
            capacity = unit.capacity,
            "Growing unit created"
        );
        self.ctx.events.publish(DomainEvent::GrowingUnitCreated {
            owner_id,
            growing_unit_id: unit.id,
            location_id: unit.location_id,
            occurred_at: unit.created_at,
        });
        Ok(unit)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateGrowingUnit,
    ) -> Result<GrowingUnit, GrowingUnitError> {
        let changes = GrowingUnitChanges {
            name: data.name.as_deref().map(Name::new).transpose()?,
            unit_type: data.unit_type,
            capacity: data.capacity.map(Capacity::new).transpose()?,
            dimensions: data
                .dimensions
                .map(|d| d.as_ref().map(validate_dimensions).transpose())
                .transpose()?,
        };

        let mut tx = self.ctx.pool().begin().await?;
        let mut unit = GrowingUnit::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(GrowingUnitError::NotFound(id))?;

        if let Some(capacity) = changes.capacity {
            let plants = Plant::count_by_growing_unit_id(&mut *tx, id).await?;
            if capacity.value() < plants {
                return Err(GrowingUnitError::CapacityBelowOccupancy {
                    capacity: capacity.value(),
                    plants,
                });
            }
        }

        if !unit.apply(changes) {
            return Ok(unit);
        }
        unit.save(&mut *tx).await?;
        tx.commit().await?;

        self.ctx.events.publish(DomainEvent::GrowingUnitUpdated {
            owner_id,
            growing_unit_id: id,
            location_id: unit.location_id,
            occurred_at: unit.updated_at,
        });
        Ok(unit)
    }

    /// Move a unit, with all its plants, to another location of the same owner.
    pub async fn move_to(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: MoveGrowingUnit,
    ) -> Result<GrowingUnit, GrowingUnitError> {
        let mut tx = self.ctx.pool().begin().await?;
        let mut unit = GrowingUnit::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(GrowingUnitError::NotFound(id))?;
        Location::find_by_id(&mut *tx, owner_id, data.location_id)
            .await?
            .ok_or(GrowingUnitError::LocationNotFound(data.location_id))?;

        if unit.location_id == data.location_id {
            return Ok(unit);
        }
        let from_location_id = unit.relocate(data.location_id);
        unit.save(&mut *tx).await?;
        tx.commit().await?;

        info!(
            growing_unit_id = %id,
            from_location_id = %from_location_id,
            to_location_id = %data.location_id,
            "Growing unit moved"
        );
        self.ctx.events.publish(DomainEvent::GrowingUnitMoved {
            owner_id,
            growing_unit_id: id,
            from_location_id,
            to_location_id: data.location_id,
            occurred_at: unit.updated_at,
        });
        Ok(unit)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), GrowingUnitError> {
        let mut tx = self.ctx.pool().begin().await?;
        let unit = GrowingUnit::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(GrowingUnitError::NotFound(id))?;

        let plants = Plant::count_by_growing_unit_id(&mut *tx, id).await?;
        if plants > 0 {
            return Err(GrowingUnitError::NotEmpty { id, plants });
        }
        GrowingUnit::delete(&mut *tx, owner_id, id).await?;
        tx.commit().await?;

        info!(growing_unit_id = %id, "Growing unit deleted");
        self.ctx.events.publish(DomainEvent::GrowingUnitDeleted {
            owner_id,
            growing_unit_id: id,
            location_id: unit.location_id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn find(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<GrowingUnitView, GrowingUnitError> {
        self.ctx
            .read_store
            .get(Collection::GrowingUnits, owner_id, id)
            .await?
            .ok_or(GrowingUnitError::NotFound(id))
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &GrowingUnitFilter,
    ) -> Result<Paginated<GrowingUnitView>, GrowingUnitError> {
        let listing = ListParams {
            sort_by: filter.sort_by.as_deref(),
            direction: filter.direction.as_deref(),
            page: filter.page,
            per_page: filter.per_page,
        }
        .resolve(self.ctx.pagination)?;
        let unit_type: Option<GrowingUnitType> =
            parse_filter("unit_type", filter.unit_type.as_deref())?;

        let views: Vec<GrowingUnitView> = self
            .ctx
            .read_store
            .list(Collection::GrowingUnits, owner_id)
            .await?;
        let matching = views
            .into_iter()
            .filter(|v| filter.location_id.is_none_or(|id| v.location.id == id))
            .filter(|v| unit_type.is_none_or(|t| v.unit_type == t))
            .filter(|v| {
                filter
                    .has_free_capacity
                    .is_none_or(|wanted| (v.remaining_capacity > 0) == wanted)
            })
            .filter(|v| name_matches(&v.name, filter.name.as_deref()))
            .collect();

        Ok(listing.apply(matching))
    }
}
