use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    plant::{ChangePlantStatus, CreatePlant, Plant, TransplantPlant, UpdatePlant},
    views::PlantView,
};
use deployment::Deployment;
use services::services::{plants::PlantFilter, query::Paginated};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
    tenant::Tenant,
};

/// List the plants of the calling tenant
pub async fn list_plants(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Query(filter): Query<PlantFilter>,
) -> Result<ResponseJson<ApiResponse<Paginated<PlantView>>>, ApiError> {
    let page = deployment.plants().list(owner_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// Get a single plant
pub async fn get_plant(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PlantView>>, ApiError> {
    let view = deployment.plants().find(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Add a plant to a growing unit with free capacity
pub async fn add_plant(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Json(payload): Json<CreatePlant>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Plant>>), ApiError> {
    let plant = deployment.plants().add(owner_id, payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(plant))))
}

/// Update a plant
pub async fn update_plant(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlant>,
) -> Result<ResponseJson<ApiResponse<Plant>>, ApiError> {
    let plant = deployment.plants().update(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(plant)))
}

/// Change the status of a plant
pub async fn change_plant_status(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePlantStatus>,
) -> Result<ResponseJson<ApiResponse<Plant>>, ApiError> {
    let plant = deployment.plants().change_status(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(plant)))
}

/// Transplant a plant into another growing unit
pub async fn transplant_plant(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransplantPlant>,
) -> Result<ResponseJson<ApiResponse<Plant>>, ApiError> {
    let plant = deployment.plants().transplant(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(plant)))
}

/// Remove a plant
pub async fn remove_plant(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.plants().remove(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/plants",
        Router::new()
            .route("/", get(list_plants).post(add_plant))
            .route(
                "/{id}",
                get(get_plant).put(update_plant).delete(remove_plant),
            )
            .route("/{id}/status", post(change_plant_status))
            .route("/{id}/transplant", post(transplant_plant)),
    )
}
