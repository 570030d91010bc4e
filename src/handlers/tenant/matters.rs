// handlers/tenant/matters.rs - /api/matters

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::app::AppState;
use crate::database::models::{Client, Matter, NewMatter};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::ScopedRecords;
use crate::tenancy::{Identity, SecurityContext};

use super::require_permission;

/// GET /api/matters
pub async fn matters_index(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<Vec<Matter>> {
    require_permission(&state, identity.as_deref(), &security, "view matters").await?;

    let matters = ScopedRecords::new(state.matters.as_ref(), &security).all().await?;
    Ok(ApiResponse::success(matters))
}

/// POST /api/matters
pub async fn matters_store(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Json(draft): Json<NewMatter>,
) -> ApiResult<Matter> {
    require_permission(&state, identity.as_deref(), &security, "create matters").await?;

    if draft.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "The title field is required."));
    }

    let clients: ScopedRecords<Client> = ScopedRecords::new(state.clients.as_ref(), &security);
    if clients.find(draft.client_id).await?.is_none() {
        return Err(ApiError::invalid_field("client_id", "The selected client is invalid."));
    }

    let matter = ScopedRecords::new(state.matters.as_ref(), &security)
        .create(draft)
        .await?;
    Ok(ApiResponse::created(matter))
}

/// GET /api/matters/:id
pub async fn matters_show(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<i64>,
) -> ApiResult<Matter> {
    require_permission(&state, identity.as_deref(), &security, "view matters").await?;

    let matter = ScopedRecords::new(state.matters.as_ref(), &security)
        .find_or_not_found(id)
        .await?;
    Ok(ApiResponse::success(matter))
}

/// DELETE /api/matters/:id
pub async fn matters_destroy(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, identity.as_deref(), &security, "delete matters").await?;

    let matters: ScopedRecords<Matter> = ScopedRecords::new(state.matters.as_ref(), &security);
    if !matters.delete(id).await? {
        return Err(ApiError::not_found(format!("Matter {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
