// handlers/tenant/clients.rs - /api/clients

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::app::AppState;
use crate::database::models::{Client, NewClient};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::ScopedRecords;
use crate::tenancy::{Identity, SecurityContext};

use super::require_permission;

/// GET /api/clients
pub async fn clients_index(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<Vec<Client>> {
    require_permission(&state, identity.as_deref(), &security, "view clients").await?;

    let clients = ScopedRecords::new(state.clients.as_ref(), &security).all().await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients
pub async fn clients_store(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Json(draft): Json<NewClient>,
) -> ApiResult<Client> {
    require_permission(&state, identity.as_deref(), &security, "create clients").await?;

    if draft.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "The name field is required."));
    }

    let client = ScopedRecords::new(state.clients.as_ref(), &security)
        .create(draft)
        .await?;
    Ok(ApiResponse::created(client))
}

/// GET /api/clients/:id
pub async fn clients_show(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<i64>,
) -> ApiResult<Client> {
    require_permission(&state, identity.as_deref(), &security, "view clients").await?;

    let client = ScopedRecords::new(state.clients.as_ref(), &security)
        .find_or_not_found(id)
        .await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:id
pub async fn clients_destroy(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_permission(&state, identity.as_deref(), &security, "delete clients").await?;

    let clients: ScopedRecords<Client> = ScopedRecords::new(state.clients.as_ref(), &security);
    if !clients.delete(id).await? {
        return Err(ApiError::not_found(format!("Client {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
