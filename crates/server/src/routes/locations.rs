use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    location::{CreateLocation, Location, UpdateLocation},
    views::LocationView,
};
use deployment::Deployment;
use services::services::{locations::LocationFilter, query::Paginated};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
    tenant::Tenant,
};

/// List the locations of the calling tenant
pub async fn list_locations(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Query(filter): Query<LocationFilter>,
) -> Result<ResponseJson<ApiResponse<Paginated<LocationView>>>, ApiError> {
    let page = deployment.locations().list(owner_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// Get a single location
pub async fn get_location(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<LocationView>>, ApiError> {
    let view = deployment.locations().find(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Create a location
pub async fn create_location(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Json(payload): Json<CreateLocation>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Location>>), ApiError> {
    let location = deployment.locations().create(owner_id, payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(location))))
}

/// Update a location
pub async fn update_location(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocation>,
) -> Result<ResponseJson<ApiResponse<Location>>, ApiError> {
    let location = deployment.locations().update(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(location)))
}

/// Delete a location that holds no growing units
pub async fn delete_location(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.locations().delete(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/locations",
        Router::new()
            .route("/", get(list_locations).post(create_location))
            .route(
                "/{id}",
                get(get_location).put(update_location).delete(delete_location),
            ),
    )
}
