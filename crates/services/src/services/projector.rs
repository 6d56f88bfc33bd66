//! Keeps the read store in step with the write store.
//!
//! Every handler re-reads the aggregates an event touches and overwrites
//! their documents, so applying an event twice, or out of order, converges on
//! the same views. A view whose aggregate no longer exists is deleted.

use std::sync::Arc;

use db::{
    DBService, ReadStore,
    models::{
        growing_unit::GrowingUnit,
        location::Location,
        plant::Plant,
        plant_species::PlantSpecies,
        views::{
            GrowingUnitSummary, GrowingUnitView, LocationSummary, LocationView, PlantSpeciesView,
            PlantSummary, PlantView, SpeciesSummary,
        },
    },
    read_store::{Collection, ReadStoreError},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::{
    sync::{
        Mutex,
        broadcast::{self, error::RecvError},
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use utils::stats::percentage;
use uuid::Uuid;

use super::events::DomainEvent;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("read store error: {0}")]
    ReadStore(#[from] ReadStoreError),
}

/// Number of documents written by a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct RebuildSummary {
    pub locations: usize,
    pub growing_units: usize,
    pub plants: usize,
    pub plant_species: usize,
}

fn location_summary(location: &Location) -> LocationSummary {
    LocationSummary {
        id: location.id,
        name: location.name.clone(),
        location_type: location.location_type,
    }
}

/// Clones share one write guard, so a rebuild and an event handler never
/// interleave their reads and writes.
#[derive(Clone)]
pub struct Projector {
    db: DBService,
    read_store: ReadStore,
    guard: Arc<Mutex<()>>,
}

impl Projector {
    pub fn new(db: DBService, read_store: ReadStore) -> Self {
        Self {
            db,
            read_store,
            guard: Arc::new(Mutex::new(())),
        }
    }

    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub async fn handle(&self, event: &DomainEvent) -> Result<(), ProjectionError> {
        let _guard = self.guard.lock().await;
        debug!(event = event.name(), aggregate_id = %event.aggregate_id(), "Projecting event");
        let owner = event.owner_id();
        match *event {
            DomainEvent::LocationCreated { location_id, .. }
            | DomainEvent::LocationDeleted { location_id, .. } => {
                self.refresh_location(owner, location_id).await?;
            }
            DomainEvent::LocationUpdated { location_id, .. } => {
                self.refresh_location(owner, location_id).await?;
                for unit in GrowingUnit::find_by_location_id(self.pool(), location_id).await? {
                    self.refresh_unit_with_plants(owner, unit.id).await?;
                }
            }
            DomainEvent::GrowingUnitCreated {
                growing_unit_id,
                location_id,
                ..
            }
            | DomainEvent::GrowingUnitDeleted {
                growing_unit_id,
                location_id,
                ..
            } => {
                self.refresh_growing_unit(owner, growing_unit_id).await?;
                self.refresh_location(owner, location_id).await?;
            }
            DomainEvent::GrowingUnitUpdated {
                growing_unit_id,
                location_id,
                ..
            } => {
                self.refresh_unit_with_plants(owner, growing_unit_id).await?;
                self.refresh_location(owner, location_id).await?;
            }
            DomainEvent::GrowingUnitMoved {
                growing_unit_id,
                from_location_id,
                to_location_id,
                ..
            } => {
                self.refresh_unit_with_plants(owner, growing_unit_id).await?;
                self.refresh_location(owner, from_location_id).await?;
                self.refresh_location(owner, to_location_id).await?;
            }
            DomainEvent::PlantAdded {
                plant_id,
                growing_unit_id,
                species_id,
                ..
            }
            | DomainEvent::PlantRemoved {
                plant_id,
                growing_unit_id,
                species_id,
                ..
            } => {
                self.refresh_plant(owner, plant_id).await?;
                self.refresh_unit_and_location(owner, growing_unit_id).await?;
                if let Some(species_id) = species_id {
                    self.refresh_species(owner, species_id).await?;
                }
            }
            DomainEvent::PlantUpdated {
                plant_id,
                growing_unit_id,
                species_id,
                previous_species_id,
                ..
            } => {
                self.refresh_plant(owner, plant_id).await?;
                self.refresh_growing_unit(owner, growing_unit_id).await?;
                for species_id in [species_id, previous_species_id].into_iter().flatten() {
                    self.refresh_species(owner, species_id).await?;
                }
            }
            DomainEvent::PlantStatusChanged {
                plant_id,
                growing_unit_id,
                ..
            } => {
                self.refresh_plant(owner, plant_id).await?;
                self.refresh_growing_unit(owner, growing_unit_id).await?;
            }
            DomainEvent::PlantTransplanted {
                plant_id,
                from_growing_unit_id,
                to_growing_unit_id,
                ..
            } => {
                self.refresh_plant(owner, plant_id).await?;
                self.refresh_unit_and_location(owner, from_growing_unit_id)
                    .await?;
                self.refresh_unit_and_location(owner, to_growing_unit_id)
                    .await?;
            }
            DomainEvent::PlantSpeciesCreated { species_id, .. }
            | DomainEvent::PlantSpeciesDeleted { species_id, .. } => {
                self.refresh_species(owner, species_id).await?;
            }
            DomainEvent::PlantSpeciesUpdated { species_id, .. } => {
                self.refresh_species(owner, species_id).await?;
                for plant in Plant::find_by_species_id(self.pool(), species_id).await? {
                    self.refresh_plant(owner, plant.id).await?;
                }
            }
        }
        Ok(())
    }

    /// Drop and recreate every view of one owner, or of all owners.
    pub async fn rebuild(&self, owner_id: Option<Uuid>) -> Result<RebuildSummary, ProjectionError> {
        let _guard = self.guard.lock().await;
        let cleared = self.read_store.clear(owner_id).await?;
        let mut summary = RebuildSummary::default();

        for location in Location::find_all(self.pool(), owner_id).await? {
            self.refresh_location(location.owner_id, location.id).await?;
            summary.locations += 1;
        }
        for unit in GrowingUnit::find_all(self.pool(), owner_id).await? {
            self.refresh_growing_unit(unit.owner_id, unit.id).await?;
            summary.growing_units += 1;
        }
        for plant in Plant::find_all(self.pool(), owner_id).await? {
            self.refresh_plant(plant.owner_id, plant.id).await?;
            summary.plants += 1;
        }
        for species in PlantSpecies::find_all(self.pool(), owner_id).await? {
            self.refresh_species(species.owner_id, species.id).await?;
            summary.plant_species += 1;
        }

        info!(
            owner_id = ?owner_id,
            cleared,
            locations = summary.locations,
            growing_units = summary.growing_units,
            plants = summary.plants,
            plant_species = summary.plant_species,
            "Read models rebuilt"
        );
        Ok(summary)
    }

    /// Apply events as they arrive until the bus closes. A lagging receiver
    /// has lost events, so it falls back to a full rebuild.
    pub fn spawn(self, mut receiver: broadcast::Receiver<DomainEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Starting projector");
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle(&event).await {
                            error!(event = event.name(), "Failed to project event: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Projector fell behind the event bus, rebuilding read models");
                        if let Err(e) = self.rebuild(None).await {
                            error!("Failed to rebuild read models: {}", e);
                        }
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed, stopping projector");
                        break;
                    }
                }
            }
        })
    }

    async fn refresh_location(&self, owner_id: Uuid, id: Uuid) -> Result<(), ProjectionError> {
        let Some(location) = Location::find_by_id(self.pool(), owner_id, id).await? else {
            self.read_store.delete(Collection::Locations, id).await?;
            return Ok(());
        };
        let growing_units_count = GrowingUnit::count_by_location_id(self.pool(), id).await?;
        let plants_count = Plant::find_by_location_id(self.pool(), id).await?.len() as i64;

        let view = LocationView {
            id: location.id,
            owner_id: location.owner_id,
            name: location.name,
            location_type: location.location_type,
            description: location.description,
            growing_units_count,
            plants_count,
            created_at: location.created_at,
            updated_at: location.updated_at,
        };
        self.read_store
            .upsert(Collection::Locations, id, owner_id, &view)
            .await?;
        Ok(())
    }

    /// Returns the unit so callers can follow up on its location.
    async fn refresh_growing_unit(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<GrowingUnit>, ProjectionError> {
        let Some(unit) = GrowingUnit::find_by_id(self.pool(), owner_id, id).await? else {
            self.read_store.delete(Collection::GrowingUnits, id).await?;
            return Ok(None);
        };
        let Some(location) = Location::find_by_id(self.pool(), owner_id, unit.location_id).await?
        else {
            warn!(growing_unit_id = %id, location_id = %unit.location_id, "Growing unit without location");
            return Ok(None);
        };

        let plants = Plant::find_by_growing_unit_id(self.pool(), id).await?;
        let plants_count = plants.len() as i64;
        let view = GrowingUnitView {
            id: unit.id,
            owner_id: unit.owner_id,
            location: location_summary(&location),
            name: unit.name.clone(),
            unit_type: unit.unit_type,
            capacity: unit.capacity,
            dimensions: unit.dimensions,
            plants_count,
            remaining_capacity: unit.remaining_capacity(plants_count),
            occupancy_percentage: percentage(plants_count as f64, unit.capacity as f64),
            plants: plants
                .into_iter()
                .map(|p| PlantSummary {
                    id: p.id,
                    name: p.name,
                    status: p.status,
                    species_id: p.species_id,
                })
                .collect(),
            created_at: unit.created_at,
            updated_at: unit.updated_at,
        };
        self.read_store
            .upsert(Collection::GrowingUnits, id, owner_id, &view)
            .await?;
        Ok(Some(unit))
    }

    async fn refresh_unit_and_location(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<(), ProjectionError> {
        if let Some(unit) = self.refresh_growing_unit(owner_id, id).await? {
            self.refresh_location(owner_id, unit.location_id).await?;
        }
        Ok(())
    }

    async fn refresh_unit_with_plants(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<(), ProjectionError> {
        self.refresh_growing_unit(owner_id, id).await?;
        for plant in Plant::find_by_growing_unit_id(self.pool(), id).await? {
            self.refresh_plant(owner_id, plant.id).await?;
        }
        Ok(())
    }

    async fn refresh_plant(&self, owner_id: Uuid, id: Uuid) -> Result<(), ProjectionError> {
        let Some(plant) = Plant::find_by_id(self.pool(), owner_id, id).await? else {
            self.read_store.delete(Collection::Plants, id).await?;
            return Ok(());
        };
        let Some(unit) = GrowingUnit::find_by_id(self.pool(), owner_id, plant.growing_unit_id).await?
        else {
            warn!(plant_id = %id, "Plant without growing unit");
            return Ok(());
        };
        let Some(location) = Location::find_by_id(self.pool(), owner_id, unit.location_id).await?
        else {
            warn!(plant_id = %id, location_id = %unit.location_id, "Plant without location");
            return Ok(());
        };
        let species = match plant.species_id {
            Some(species_id) => PlantSpecies::find_by_id(self.pool(), owner_id, species_id)
                .await?
                .map(|s| SpeciesSummary {
                    id: s.id,
                    common_name: s.common_name,
                    scientific_name: s.scientific_name,
                }),
            None => None,
        };

        let view = PlantView {
            id: plant.id,
            owner_id: plant.owner_id,
            name: plant.name,
            status: plant.status,
            planted_date: plant.planted_date,
            notes: plant.notes,
            growing_unit: GrowingUnitSummary {
                id: unit.id,
                name: unit.name,
                unit_type: unit.unit_type,
            },
            location: location_summary(&location),
            species,
            created_at: plant.created_at,
            updated_at: plant.updated_at,
        };
        self.read_store
            .upsert(Collection::Plants, id, owner_id, &view)
            .await?;
        Ok(())
    }

    async fn refresh_species(&self, owner_id: Uuid, id: Uuid) -> Result<(), ProjectionError> {
        let Some(species) = PlantSpecies::find_by_id(self.pool(), owner_id, id).await? else {
            self.read_store.delete(Collection::PlantSpecies, id).await?;
            return Ok(());
        };
        let plants_count = Plant::count_by_species_id(self.pool(), id).await?;

        let view = PlantSpeciesView {
            id: species.id,
            owner_id: species.owner_id,
            common_name: species.common_name,
            scientific_name: species.scientific_name,
            family: species.family,
            category: species.category,
            growth_rate: species.growth_rate,
            sun_requirement: species.sun_requirement,
            water_requirement: species.water_requirement,
            ph_range: species.ph_range,
            temperature_range: species.temperature_range,
            days_to_maturity: species.days_to_maturity,
            description: species.description,
            plants_count,
            created_at: species.created_at,
            updated_at: species.updated_at,
        };
        self.read_store
            .upsert(Collection::PlantSpecies, id, owner_id, &view)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use db::models::growing_unit::UpdateGrowingUnit;

    use super::*;
    use crate::services::{
        events::EventBus,
        test_support::{TestGarden, create_location},
    };

    #[tokio::test]
    async fn replaying_events_is_idempotent() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (location, unit) = garden.seed_unit(owner, 4).await;
        garden.add_plant(owner, unit.id, "Sage").await.unwrap();
        let events = garden.drain().await;

        for event in &events {
            garden.projector.handle(event).await.unwrap();
        }
        let first: LocationView = garden.locations.find(owner, location.id).await.unwrap();
        for event in events.iter().rev() {
            garden.projector.handle(event).await.unwrap();
        }
        let second: LocationView = garden.locations.find(owner, location.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.plants_count, 1);
        assert_eq!(second.growing_units_count, 1);
    }

    #[tokio::test]
    async fn location_rename_reaches_units_and_plants() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (location, unit) = garden.seed_unit(owner, 4).await;
        let plant = garden.add_plant(owner, unit.id, "Dill").await.unwrap();
        garden.project().await;

        garden
            .locations
            .update(
                owner,
                location.id,
                db::models::location::UpdateLocation {
                    name: Some("Allotment".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        garden.project().await;

        let unit_view = garden.growing_units.find(owner, unit.id).await.unwrap();
        let plant_view = garden.plants.find(owner, plant.id).await.unwrap();
        assert_eq!(unit_view.location.name, "Allotment");
        assert_eq!(plant_view.location.name, "Allotment");
    }

    #[tokio::test]
    async fn unit_rename_reaches_its_plants() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 4).await;
        let plant = garden.add_plant(owner, unit.id, "Chives").await.unwrap();
        garden
            .growing_units
            .update(
                owner,
                unit.id,
                UpdateGrowingUnit {
                    name: Some("Herb box".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        garden.project().await;

        let plant_view = garden.plants.find(owner, plant.id).await.unwrap();
        assert_eq!(plant_view.growing_unit.name, "Herb box");
    }

    #[tokio::test]
    async fn rebuild_restores_a_wiped_read_store() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 3).await;
        garden.add_plant(owner, unit.id, "Parsley").await.unwrap();
        create_location(&garden, other, "Roof").await;
        garden.drain().await;

        let summary = garden.projector.rebuild(Some(owner)).await.unwrap();
        assert_eq!(
            summary,
            RebuildSummary {
                locations: 1,
                growing_units: 1,
                plants: 1,
                plant_species: 0,
            }
        );
        assert_eq!(
            garden.ctx.read_store.count(Collection::Locations, other).await.unwrap(),
            0
        );

        let summary = garden.projector.rebuild(None).await.unwrap();
        assert_eq!(summary.locations, 2);
        let view = garden.growing_units.find(owner, unit.id).await.unwrap();
        assert_eq!(view.plants_count, 1);
    }

    #[tokio::test]
    async fn spawned_projector_follows_the_bus() {
        let db = DBService::new_in_memory().await.unwrap();
        let read_store = ReadStore::new_in_memory().await.unwrap();
        let bus = EventBus::new(16);
        let handle = Projector::new(db.clone(), read_store.clone()).spawn(bus.subscribe());

        let owner = Uuid::new_v4();
        let location = Location::new(
            owner,
            db::models::values::Name::new("Shed").unwrap(),
            db::models::values::LocationType::Other,
            db::models::values::Description::default(),
        );
        location.insert(&db.pool).await.unwrap();
        bus.publish(DomainEvent::LocationCreated {
            owner_id: owner,
            location_id: location.id,
            occurred_at: location.created_at,
        });

        let mut projected = None;
        for _ in 0..50 {
            projected = read_store
                .get::<LocationView>(Collection::Locations, owner, location.id)
                .await
                .unwrap();
            if projected.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(projected.map(|v| v.name), Some("Shed".to_string()));

        drop(bus);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    fn shed(owner: Uuid, name: &str) -> Location {
        Location::new(
            owner,
            db::models::values::Name::new(name).unwrap(),
            db::models::values::LocationType::Other,
            db::models::values::Description::default(),
        )
    }

    #[tokio::test]
    async fn lagging_projector_rebuilds_everything() {
        let db = DBService::new_in_memory().await.unwrap();
        let read_store = ReadStore::new_in_memory().await.unwrap();
        let bus = EventBus::new(2);
        let receiver = bus.subscribe();

        let owner = Uuid::new_v4();
        for n in 0..10 {
            let location = shed(owner, &format!("Shed {n}"));
            location.insert(&db.pool).await.unwrap();
            bus.publish(DomainEvent::LocationCreated {
                owner_id: owner,
                location_id: location.id,
                occurred_at: location.created_at,
            });
        }
        let _handle = Projector::new(db.clone(), read_store.clone()).spawn(receiver);

        let mut projected = 0;
        for _ in 0..100 {
            projected = read_store.count(Collection::Locations, owner).await.unwrap();
            if projected == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(projected, 10);
    }

    #[tokio::test]
    async fn handlers_wait_for_a_running_rebuild() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        create_location(&garden, owner, "Porch").await;
        let events = garden.drain().await;

        let held = garden.projector.guard.lock().await;
        let projector = garden.projector.clone();
        let task = tokio::spawn(async move {
            for event in &events {
                projector.handle(event).await.unwrap();
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            garden.ctx.read_store.count(Collection::Locations, owner).await.unwrap(),
            0
        );

        drop(held);
        task.await.unwrap();
        assert_eq!(
            garden.ctx.read_store.count(Collection::Locations, owner).await.unwrap(),
            1
        );
    }
}
