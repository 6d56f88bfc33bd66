use db::{
    DBService, ReadStore,
    models::{
        growing_unit::{CreateGrowingUnit, GrowingUnit},
        location::{CreateLocation, Location},
        plant::{CreatePlant, Plant},
        plant_species::{CreatePlantSpecies, PlantSpecies},
        values::{GrowingUnitType, LocationType, PlantCategory},
    },
};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use super::{
    config::PaginationConfig,
    context::ServiceContext,
    events::{DomainEvent, EventBus},
    growing_units::GrowingUnitService,
    locations::LocationService,
    overview::OverviewService,
    plant_species::PlantSpeciesService,
    plants::{PlantError, PlantService},
    projector::Projector,
};

/// In-memory write and read stores with every service wired to one bus.
/// Events are applied to the read side only when a test calls `project`.
pub struct TestGarden {
    pub ctx: ServiceContext,
    pub locations: LocationService,
    pub growing_units: GrowingUnitService,
    pub plants: PlantService,
    pub plant_species: PlantSpeciesService,
    pub overview: OverviewService,
    pub projector: Projector,
    receiver: Mutex<broadcast::Receiver<DomainEvent>>,
}

impl TestGarden {
    pub async fn new() -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        let read_store = ReadStore::new_in_memory().await.unwrap();
        let events = EventBus::new(256);
        let receiver = Mutex::new(events.subscribe());
        let ctx = ServiceContext::new(db, read_store, events, PaginationConfig::default());

        Self {
            locations: LocationService::new(ctx.clone()),
            growing_units: GrowingUnitService::new(ctx.clone()),
            plants: PlantService::new(ctx.clone()),
            plant_species: PlantSpeciesService::new(ctx.clone()),
            overview: OverviewService::new(ctx.clone()),
            projector: Projector::new(ctx.db.clone(), ctx.read_store.clone()),
            ctx,
            receiver,
        }
    }

    /// Take every event published so far without projecting it.
    pub async fn drain(&self) -> Vec<DomainEvent> {
        let mut receiver = self.receiver.lock().await;
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Apply every pending event to the read store.
    pub async fn project(&self) {
        for event in self.drain().await {
            self.projector.handle(&event).await.unwrap();
        }
    }

    pub async fn seed_unit(&self, owner_id: Uuid, capacity: i64) -> (Location, GrowingUnit) {
        let location = create_location(self, owner_id, "Garden").await;
        let unit = self
            .growing_units
            .create(
                owner_id,
                CreateGrowingUnit {
                    location_id: location.id,
                    name: format!("Bed for {capacity}"),
                    unit_type: GrowingUnitType::GardenBed,
                    capacity,
                    dimensions: None,
                },
            )
            .await
            .unwrap();
        (location, unit)
    }

    pub async fn add_plant(
        &self,
        owner_id: Uuid,
        growing_unit_id: Uuid,
        name: &str,
    ) -> Result<Plant, PlantError> {
        self.plants
            .add(
                owner_id,
                CreatePlant {
                    growing_unit_id,
                    name: name.to_string(),
                    species_id: None,
                    status: None,
                    planted_date: None,
                    notes: None,
                },
            )
            .await
    }
}

pub async fn create_location(garden: &TestGarden, owner_id: Uuid, name: &str) -> Location {
    garden
        .locations
        .create(
            owner_id,
            CreateLocation {
                name: name.to_string(),
                location_type: LocationType::Garden,
                description: None,
            },
        )
        .await
        .unwrap()
}

pub async fn create_species(
    garden: &TestGarden,
    owner_id: Uuid,
    scientific_name: &str,
) -> PlantSpecies {
    garden
        .plant_species
        .create(
            owner_id,
            CreatePlantSpecies {
                common_name: scientific_name.to_string(),
                scientific_name: scientific_name.to_string(),
                family: None,
                category: PlantCategory::Herb,
                growth_rate: None,
                sun_requirement: None,
                water_requirement: None,
                ph_range: None,
                temperature_range: None,
                days_to_maturity: None,
                description: None,
            },
        )
        .await
        .unwrap()
}
