// handlers/tenant/mod.rs - Handlers that run inside an active tenant scope
//
// The tenant middleware has already resolved, authorized and entered the tenant.
// Handlers only check role permissions against the scope's partition and read
// tenant-owned data through ScopedRecords.

use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::tenancy::{roles, Identity, SecurityContext};

pub mod clients;
pub mod context;
pub mod matters;

pub use clients::{clients_destroy, clients_index, clients_show, clients_store};
pub use context::context_show;
pub use matters::{matters_destroy, matters_index, matters_show, matters_store};

/// Require `permission` for the identity in the active partition.
pub(crate) async fn require_permission(
    state: &AppState,
    identity: Option<&Identity>,
    security: &SecurityContext,
    permission: &str,
) -> Result<(), ApiError> {
    let Some(identity) = identity else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let partition = security.partition();
    if roles::can(state.roles.as_ref(), identity.user_id, &partition, permission).await? {
        return Ok(());
    }

    warn!(
        "User {} lacks '{}' in partition {}",
        identity.user_id, permission, partition
    );
    Err(ApiError::forbidden(format!(
        "You do not have permission to {}.",
        permission
    )))
}
