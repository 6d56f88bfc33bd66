use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    growing_unit::{CreateGrowingUnit, GrowingUnit, MoveGrowingUnit, UpdateGrowingUnit},
    views::GrowingUnitView,
};
use deployment::Deployment;
use services::services::{growing_units::GrowingUnitFilter, query::Paginated};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
    tenant::Tenant,
};

/// List the growing units of the calling tenant
pub async fn list_growing_units(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Query(filter): Query<GrowingUnitFilter>,
) -> Result<ResponseJson<ApiResponse<Paginated<GrowingUnitView>>>, ApiError> {
    let page = deployment.growing_units().list(owner_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// Get a single growing unit with its plants
pub async fn get_growing_unit(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<GrowingUnitView>>, ApiError> {
    let view = deployment.growing_units().find(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Create a growing unit in one of the tenant's locations
pub async fn create_growing_unit(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Json(payload): Json<CreateGrowingUnit>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GrowingUnit>>), ApiError> {
    let unit = deployment.growing_units().create(owner_id, payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(unit))))
}

/// Update a growing unit
pub async fn update_growing_unit(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGrowingUnit>,
) -> Result<ResponseJson<ApiResponse<GrowingUnit>>, ApiError> {
    let unit = deployment.growing_units().update(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(unit)))
}

/// Move a growing unit to another location
pub async fn move_growing_unit(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveGrowingUnit>,
) -> Result<ResponseJson<ApiResponse<GrowingUnit>>, ApiError> {
    let unit = deployment.growing_units().move_to(owner_id, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(unit)))
}

/// Delete an empty growing unit
pub async fn delete_growing_unit(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.growing_units().delete(owner_id, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/growing-units",
        Router::new()
            .route("/", get(list_growing_units).post(create_growing_unit))
            .route(
                "/{id}",
                get(get_growing_unit)
                    .put(update_growing_unit)
                    .delete(delete_growing_unit),
            )
            .route("/{id}/move", post(move_growing_unit)),
    )
}
