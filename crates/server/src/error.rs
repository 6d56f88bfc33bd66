use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::read_store::ReadStoreError;
use deployment::DeploymentError;
use services::services::{
    growing_units::GrowingUnitError, locations::LocationError, plant_species::PlantSpeciesError,
    plants::PlantError, projector::ProjectionError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    GrowingUnit(#[from] GrowingUnitError),
    #[error(transparent)]
    Plant(#[from] PlantError),
    #[error(transparent)]
    PlantSpecies(#[from] PlantSpeciesError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    ReadStore(#[from] ReadStoreError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Location(err) => match err {
                LocationError::Validation(_) => StatusCode::BAD_REQUEST,
                LocationError::NotFound(_) => StatusCode::NOT_FOUND,
                LocationError::NotEmpty { .. } => StatusCode::CONFLICT,
                LocationError::Database(_) | LocationError::ReadStore(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::GrowingUnit(err) => match err {
                GrowingUnitError::Validation(_) => StatusCode::BAD_REQUEST,
                GrowingUnitError::NotFound(_) | GrowingUnitError::LocationNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                GrowingUnitError::NotEmpty { .. }
                | GrowingUnitError::CapacityBelowOccupancy { .. } => StatusCode::CONFLICT,
                GrowingUnitError::Database(_) | GrowingUnitError::ReadStore(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Plant(err) => match err {
                PlantError::Validation(_) => StatusCode::BAD_REQUEST,
                PlantError::NotFound(_)
                | PlantError::GrowingUnitNotFound(_)
                | PlantError::SpeciesNotFound(_) => StatusCode::NOT_FOUND,
                PlantError::CapacityExceeded { .. } | PlantError::SameGrowingUnit(_) => {
                    StatusCode::CONFLICT
                }
                PlantError::Database(_) | PlantError::ReadStore(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::PlantSpecies(err) => match err {
                PlantSpeciesError::Validation(_) => StatusCode::BAD_REQUEST,
                PlantSpeciesError::NotFound(_) => StatusCode::NOT_FOUND,
                PlantSpeciesError::DuplicateScientificName(_) | PlantSpeciesError::InUse { .. } => {
                    StatusCode::CONFLICT
                }
                PlantSpeciesError::Database(_) | PlantSpeciesError::ReadStore(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Projection(_) | ApiError::ReadStore(_) | ApiError::Deployment(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage details stay in the logs.
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
