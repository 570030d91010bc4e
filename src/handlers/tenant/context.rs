// handlers/tenant/context.rs - GET /api/context

use axum::{extract::State, Extension};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{Identity, RoleStore, SecurityContext, SharedState};

/// Requester's roles and permissions in the active partition
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthView {
    pub user_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub auth: AuthView,
    #[serde(flatten)]
    pub shared: SharedState,
}

/// Presentation state for the current request
pub async fn context_show(
    State(state): State<AppState>,
    Extension(security): Extension<SecurityContext>,
    identity: Option<Extension<Identity>>,
) -> ApiResult<ContextResponse> {
    let identity = identity.map(|Extension(identity)| identity);
    let partition = security.partition();

    let auth = match &identity {
        Some(identity) => AuthView {
            user_id: Some(identity.user_id),
            roles: state.roles.roles_for(identity.user_id, &partition).await?,
            permissions: state.roles.permissions_for(identity.user_id, &partition).await?,
            is_super_admin: identity.elevated,
        },
        None => AuthView {
            user_id: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            is_super_admin: false,
        },
    };

    let shared = state
        .selector()
        .shared_state(identity.as_ref(), Some(&security))
        .await?;

    Ok(ApiResponse::success(ContextResponse { auth, shared }))
}
