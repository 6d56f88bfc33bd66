//! Locations: commands against the write store, queries against the views.

use chrono::{DateTime, Utc};
use db::{
    models::{
        growing_unit::GrowingUnit,
        location::{CreateLocation, Location, LocationChanges, UpdateLocation},
        values::{Description, LocationType, Name, ValueError},
        views::LocationView,
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
pub enum LocationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("read store error: {0}")]
    ReadStore(#[from] ReadStoreError),
    #[error(transparent)]
    Validation(#[from] ValueError),
    #[error("location {0} not found")]
    NotFound(Uuid),
    #[error("location {id} still holds {growing_units} growing unit(s)")]
    NotEmpty { id: Uuid, growing_units: i64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct LocationFilter {
    pub location_type: Option<String>,
    pub name: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Sortable for LocationView {
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

#[derive(Clone)]
pub struct LocationService {
    ctx: ServiceContext,
}

impl LocationService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        data: CreateLocation,
    ) -> Result<Location, LocationError> {
        let location = Location::new(
            owner_id,
            Name::new(&data.name)?,
            data.location_type,
            Description::new(data.description.as_deref())?,
        );
        location.insert(self.ctx.pool()).await?;

        info!(location_id = %location.id, owner_id = %owner_id, "Location created");
        self.ctx.events.publish(DomainEvent::LocationCreated {
            owner_id,
            location_id: location.id,
            occurred_at: location.created_at,
        });
        Ok(location)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateLocation,
    ) -> Result<Location, LocationError> {
        let changes = LocationChanges {
            name: data.name.as_deref().map(Name::new).transpose()?,
            location_type: data.location_type,
            description: data
                .description
                .map(|d| Description::new(d.as_deref()))
                .transpose()?,
        };

        let mut location = Location::find_by_id(self.ctx.pool(), owner_id, id)
            .await?
            .ok_or(LocationError::NotFound(id))?;
        if !location.apply(changes) {
            return Ok(location);
        }
        location.save(self.ctx.pool()).await?;

        self.ctx.events.publish(DomainEvent::LocationUpdated {
            owner_id,
            location_id: id,
            occurred_at: location.updated_at,
        });
        Ok(location)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), LocationError> {
        let mut tx = self.ctx.pool().begin().await?;
        Location::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(LocationError::NotFound(id))?;

        let growing_units = GrowingUnit::count_by_location_id(&mut *tx, id).await?;
        if growing_units > 0 {
            return Err(LocationError::NotEmpty { id, growing_units });
        }
        Location::delete(&mut *tx, owner_id, id).await?;
        tx.commit().await?;

        info!(location_id = %id, owner_id = %owner_id, "Location deleted");
        self.ctx.events.publish(DomainEvent::LocationDeleted {
            owner_id,
            location_id: id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<LocationView, LocationError> {
        self.ctx
            .read_store
            .get(Collection::Locations, owner_id, id)
            .await?
            .ok_or(LocationError::NotFound(id))
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &LocationFilter,
    ) -> Result<Paginated<LocationView>, LocationError> {
        let listing = ListParams {
            sort_by: filter.sort_by.as_deref(),
            direction: filter.direction.as_deref(),
            page: filter.page,
            per_page: filter.per_page,
        }
        .resolve(self.ctx.pagination)?;
        let location_type: Option<LocationType> =
            parse_filter("location_type", filter.location_type.as_deref())?;

        let views: Vec<LocationView> = self
            .ctx
            .read_store
            .list(Collection::Locations, owner_id)
            .await?;
        let matching = views
            .into_iter()
            .filter(|v| location_type.is_none_or(|t| v.location_type == t))
            .filter(|v| name_matches(&v.name, filter.name.as_deref()))
            .collect();

        Ok(listing.apply(matching))
    }
}
