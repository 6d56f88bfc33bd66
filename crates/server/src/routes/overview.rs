use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::views::OverviewView;
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, tenant::Tenant};

/// Get the garden statistics of the calling tenant
pub async fn get_overview(
    State(deployment): State<DeploymentImpl>,
    Tenant(owner_id): Tenant,
) -> Result<ResponseJson<ApiResponse<OverviewView>>, ApiError> {
    let overview = deployment.overview().overview(owner_id).await?;
    Ok(ResponseJson(ApiResponse::success(overview)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/overview", get(get_overview))
}
