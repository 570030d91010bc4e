// handlers/settings/tenant_context.rs - super-admin tenant context selection

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{Identity, SelectionRule, SelectorView, TenancyError};

#[derive(Debug, Deserialize)]
pub struct TenantContextUpdate {
    /// Kept as raw JSON so a non-string id is reported as such.
    #[serde(default)]
    pub tenant_id: Option<Value>,
}

fn require_identity(identity: Option<Extension<Identity>>) -> Result<Identity, ApiError> {
    identity
        .map(|Extension(identity)| identity)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

/// GET /settings/tenant-context
pub async fn tenant_context_edit(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<SelectorView> {
    let identity = require_identity(identity)?;
    let view = state.selector().view(Some(&identity)).await?;
    Ok(ApiResponse::success(view))
}

/// PUT /settings/tenant-context
pub async fn tenant_context_update(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Json(body): Json<TenantContextUpdate>,
) -> ApiResult<SelectorView> {
    let identity = require_identity(identity)?;
    let selector = state.selector();

    let tenant_id = match body.tenant_id {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id),
        Some(_) if identity.elevated => {
            return Err(TenancyError::invalid_tenant_id(SelectionRule::String).into())
        }
        Some(_) => return Err(TenancyError::Forbidden.into()),
    };

    selector.select(Some(&identity), tenant_id.as_deref()).await?;
    Ok(ApiResponse::success(selector.view(Some(&identity)).await?))
}

/// DELETE /settings/tenant-context
pub async fn tenant_context_destroy(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<SelectorView> {
    let identity = require_identity(identity)?;
    let selector = state.selector();

    selector.clear(Some(&identity)).await?;
    Ok(ApiResponse::success(selector.view(Some(&identity)).await?))
}
