use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use deployment::Deployment;
use services::services::projector::RebuildSummary;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, tenant::Tenant};

/// Rebuild the calling tenant's read models from the write store
pub async fn rebuild_read_models(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
) -> Result<ResponseJson<ApiResponse<RebuildSummary>>, ApiError> {
    let summary = deployment.rebuild_read_models(Some(owner_id)).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/admin/rebuild-read-models", post(rebuild_read_models))
}
