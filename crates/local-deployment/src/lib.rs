use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, ReadStore};
use deployment::{Deployment, DeploymentError};
use services::services::{
    config::{Config, load_config_from_file},
    context::ServiceContext,
    events::EventBus,
    growing_units::GrowingUnitService,
    locations::LocationService,
    overview::OverviewService,
    plant_species::PlantSpeciesService,
    plants::PlantService,
    projector::Projector,
};
use tokio::sync::RwLock;
use tracing::info;
use utils::assets::config_path;

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    ctx: ServiceContext,
    projector: Projector,
    locations: LocationService,
    growing_units: GrowingUnitService,
    plants: PlantService,
    plant_species: PlantSpeciesService,
    overview: OverviewService,
}

impl LocalDeployment {
    /// Both stores live in memory; nothing touches the filesystem.
    pub async fn in_memory(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new_in_memory().await?;
        let read_store = ReadStore::new_in_memory().await?;
        Self::assemble(config, db, read_store).await
    }

    async fn assemble(
        config: Config,
        db: DBService,
        read_store: ReadStore,
    ) -> Result<Self, DeploymentError> {
        let events = EventBus::new(config.projection.event_bus_capacity);
        let projector = Projector::new(db.clone(), read_store.clone());

        // Subscribe before rebuilding so nothing published meanwhile is lost.
        let receiver = events.subscribe();
        if config.projection.rebuild_on_startup {
            projector.rebuild(None).await?;
        }
        projector.clone().spawn(receiver);

        let ctx = ServiceContext::new(db, read_store, events, config.pagination);
        Ok(Self {
            locations: LocationService::new(ctx.clone()),
            growing_units: GrowingUnitService::new(ctx.clone()),
            plants: PlantService::new(ctx.clone()),
            plant_species: PlantSpeciesService::new(ctx.clone()),
            overview: OverviewService::new(ctx.clone()),
            config: Arc::new(RwLock::new(config)),
            projector,
            ctx,
        })
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let mut config = load_config_from_file(&config_path()).await;
        config.apply_env_overrides();

        let write_path = config.storage.write_db_path();
        let read_path = config.storage.read_db_path();
        let db = DBService::new(&write_path).await?;
        let read_store = ReadStore::new(&read_path).await?;
        info!(
            write_db = %write_path.display(),
            read_db = %read_path.display(),
            "Storage opened"
        );

        Self::assemble(config, db, read_store).await
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn read_store(&self) -> &ReadStore {
        &self.ctx.read_store
    }

    fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    fn projector(&self) -> &Projector {
        &self.projector
    }

    fn locations(&self) -> &LocationService {
        &self.locations
    }

    fn growing_units(&self) -> &GrowingUnitService {
        &self.growing_units
    }

    fn plants(&self) -> &PlantService {
        &self.plants
    }

    fn plant_species(&self) -> &PlantSpeciesService {
        &self.plant_species
    }

    fn overview(&self) -> &OverviewService {
        &self.overview
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use db::{
        models::{location::CreateLocation, values::LocationType},
        read_store::Collection,
    };
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn commands_reach_the_read_side_through_the_projector() {
        let deployment = LocalDeployment::in_memory(Config::default()).await.unwrap();
        let owner = Uuid::new_v4();
        assert_eq!(deployment.events().subscriber_count(), 1);

        let location = deployment
            .locations()
            .create(
                owner,
                CreateLocation {
                    name: "Conservatory".into(),
                    location_type: LocationType::Room,
                    description: None,
                },
            )
            .await
            .unwrap();

        let mut found = false;
        for _ in 0..50 {
            if deployment.locations().find(owner, location.id).await.is_ok() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(found);
    }

    #[tokio::test]
    async fn rebuild_recreates_dropped_documents() {
        let deployment = LocalDeployment::in_memory(Config::default()).await.unwrap();
        let owner = Uuid::new_v4();
        deployment
            .locations()
            .create(
                owner,
                CreateLocation {
                    name: "Shed".into(),
                    location_type: LocationType::Other,
                    description: None,
                },
            )
            .await
            .unwrap();

        deployment.read_store().clear(Some(owner)).await.unwrap();
        let summary = deployment.rebuild_read_models(Some(owner)).await.unwrap();
        assert_eq!(summary.locations, 1);
        assert_eq!(
            deployment
                .read_store()
                .count(Collection::Locations, owner)
                .await
                .unwrap(),
            1
        );
    }
}
