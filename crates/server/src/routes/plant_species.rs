use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    plant_species::{CreatePlantSpecies, PlantSpecies, UpdatePlantSpecies},
    views::PlantSpeciesView,
};
use deployment::Deployment;
use services::services::{plant_species::PlantSpeciesFilter, query::Paginated};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
    tenant::Tenant,
};

/// List the plant species of the calling tenant
pub async fn list_plant_species(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Query(filter): Query<PlantSpeciesFilter>,
) -> Result<ResponseJson<ApiResponse<Paginated<PlantSpeciesView>>>, ApiError> {
    let page = deployment.plant_species().list(owner_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// Get a single plant species
pub async fn get_plant_species(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PlantSpeciesView>>, ApiError> {
    let view = deployment.plant_species().find(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Create a plant species
pub async fn create_plant_species(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Json(payload): Json<CreatePlantSpecies>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<PlantSpecies>>), ApiError> {
    let species = deployment.plant_species().create(owner_id, payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(species))))
}

/// Update a plant species
pub async fn update_plant_species(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlantSpecies>,
) -> Result<ResponseJson<ApiResponse<PlantSpecies>>, ApiError> {
    let species = deployment.plant_species().update(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(species)))
}

/// Delete a plant species no plant refers to
pub async fn delete_plant_species(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.plant_species().delete(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/plant-species",
        Router::new()
            .route("/", get(list_plant_species).post(create_plant_species))
            .route(
                "/{id}",
                get(get_plant_species)
                    .put(update_plant_species)
                    .delete(delete_plant_species),
            ),
    )
}
