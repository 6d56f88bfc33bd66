//! Resolves the tenant a request acts for.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Owner id taken from the `x-tenant-id` header. Requests without a valid
/// UUID there are rejected before reaching a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenant(pub Uuid);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {TENANT_HEADER} header")))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized(format!("{TENANT_HEADER} is not valid text")))?;

        Uuid::parse_str(raw.trim())
            .map(Tenant)
            .map_err(|_| ApiError::Unauthorized(format!("{TENANT_HEADER} is not a valid UUID")))
    }
}
