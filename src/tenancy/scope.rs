use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::Tenant;
use crate::tenancy::roles::PermissionPartition;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("No tenant scope is active for this request")]
    NoActiveScope,
}

#[derive(Debug, Default)]
struct ScopeState {
    tenant: Option<Tenant>,
    partition: PermissionPartition,
}

/// Request-local security context: the active tenant and the permission partition.
///
/// One instance is created per request and travels in the request extensions; it is
/// never shared between requests. Both slots change together through `enter`/`exit`.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    state: Arc<RwLock<ScopeState>>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `tenant` and its permission partition. The scope ends when the guard drops.
    #[must_use = "the scope is exited as soon as the guard is dropped"]
    pub fn enter(&self, tenant: Tenant) -> ScopeGuard {
        {
            let mut state = self.state.write();
            state.partition = PermissionPartition::Tenant(tenant.id.clone());
            state.tenant = Some(tenant);
        }
        ScopeGuard { context: self.clone() }
    }

    /// Clear the tenant and reset the partition to global. Safe to call repeatedly.
    pub fn exit(&self) {
        let mut state = self.state.write();
        state.tenant = None;
        state.partition = PermissionPartition::Global;
    }

    /// Drop any partitioned permission state without touching the tenant slot.
    pub fn reset_partition(&self) {
        self.state.write().partition = PermissionPartition::Global;
    }

    pub fn is_active(&self) -> bool {
        self.state.read().tenant.is_some()
    }

    pub fn tenant(&self) -> Option<Tenant> {
        self.state.read().tenant.clone()
    }

    pub fn partition(&self) -> PermissionPartition {
        self.state.read().partition.clone()
    }

    /// Key for tenant-owned queries. Fails when no scope is active.
    pub fn tenant_key(&self) -> Result<TenantKey, ScopeError> {
        self.state
            .read()
            .tenant
            .as_ref()
            .map(|t| TenantKey(t.id.clone()))
            .ok_or(ScopeError::NoActiveScope)
    }
}

/// Exits the scope on drop, including unwinding and early returns.
#[derive(Debug)]
pub struct ScopeGuard {
    context: SecurityContext,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.context.exit();
    }
}

/// Proof of an active tenant scope. Only obtainable from [`SecurityContext::tenant_key`],
/// so every tenant-owned query is tied to the scope that was active when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantKey(String);

impl TenantKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
