use std::sync::Arc;

use async_trait::async_trait;
use db::{DbError, ReadStore};
use services::services::{
    config::{Config, ConfigError},
    events::EventBus,
    growing_units::GrowingUnitService,
    locations::LocationService,
    overview::OverviewService,
    plant_species::PlantSpeciesService,
    plants::PlantService,
    projector::{ProjectionError, Projector, RebuildSummary},
};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Everything a request handler can reach: storage, the event bus and the
/// per-context services built on top of them.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn read_store(&self) -> &ReadStore;

    fn events(&self) -> &EventBus;

    fn projector(&self) -> &Projector;

    fn locations(&self) -> &LocationService;

    fn growing_units(&self) -> &GrowingUnitService;

    fn plants(&self) -> &PlantService;

    fn plant_species(&self) -> &PlantSpeciesService;

    fn overview(&self) -> &OverviewService;

    /// Recreate the views of one owner, or of every owner, from the write store.
    async fn rebuild_read_models(
        &self,
        owner_id: Option<Uuid>,
    ) -> Result<RebuildSummary, ProjectionError> {
        self.projector().rebuild(owner_id).await
    }
}
