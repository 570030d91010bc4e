use serde::Serialize;

use crate::database::models::{TenantRecord, TenantSummary};
use crate::tenancy::directory::TenantDirectory;
use crate::tenancy::error::{SelectionRule, TenancyError};
use crate::tenancy::identity::Identity;
use crate::tenancy::scope::SecurityContext;
use crate::tenancy::session::{SessionSelection, SessionStore};

/// Tenant-context block shared with the presentation layer on every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContextView {
    pub can_select: bool,
    pub active_tenant_id: Option<String>,
    pub active_tenant: Option<TenantSummary>,
}

/// Request-scoped presentation state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    /// Tenant of the active scope, if one was entered for this request.
    pub tenant: Option<TenantRecord>,
    pub tenant_context: TenantContextView,
}

/// Settings page payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorView {
    pub tenants: Vec<TenantSummary>,
    pub active_tenant_id: Option<String>,
    pub tenant_context: TenantContextView,
}

/// Lets an elevated identity pin the tenant it operates in
pub struct TenantContextSelector<'a> {
    directory: &'a dyn TenantDirectory,
    sessions: &'a dyn SessionStore,
    session_key: &'a str,
}

impl<'a> TenantContextSelector<'a> {
    pub fn new(
        directory: &'a dyn TenantDirectory,
        sessions: &'a dyn SessionStore,
        session_key: &'a str,
    ) -> Self {
        Self {
            directory,
            sessions,
            session_key,
        }
    }

    fn ensure_elevated(identity: Option<&Identity>) -> Result<&Identity, TenancyError> {
        match identity {
            Some(identity) if identity.elevated => Ok(identity),
            _ => Err(TenancyError::Forbidden),
        }
    }

    fn selection(&self, identity: &Identity) -> SessionSelection<'a> {
        SessionSelection::new(self.sessions, identity.session_id, self.session_key)
    }

    /// All tenants, name ascending
    pub async fn list(&self, identity: Option<&Identity>) -> Result<Vec<TenantSummary>, TenancyError> {
        Self::ensure_elevated(identity)?;
        let tenants = self.directory.list_tenants().await?;
        Ok(tenants.iter().map(|t| t.summary()).collect())
    }

    /// Validate and persist a selection; returns the stored id.
    pub async fn select(
        &self,
        identity: Option<&Identity>,
        tenant_id: Option<&str>,
    ) -> Result<String, TenancyError> {
        let identity = Self::ensure_elevated(identity)?;

        let tenant_id = tenant_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TenancyError::invalid_tenant_id(SelectionRule::Required))?;

        if !self.directory.tenant_exists(tenant_id).await? {
            return Err(TenancyError::invalid_tenant_id(SelectionRule::Exists));
        }

        self.selection(identity).write(tenant_id).await?;
        tracing::info!("User {} selected tenant context '{}'", identity.user_id, tenant_id);
        Ok(tenant_id.to_string())
    }

    pub async fn clear(&self, identity: Option<&Identity>) -> Result<(), TenancyError> {
        let identity = Self::ensure_elevated(identity)?;
        self.selection(identity).clear().await?;
        tracing::info!("User {} cleared tenant context", identity.user_id);
        Ok(())
    }

    /// Stored selection if it still names a tenant; a stale id is cleared.
    pub async fn active_tenant_id(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<String>, TenancyError> {
        let identity = Self::ensure_elevated(identity)?;
        let tenant = self.selection(identity).resolve(self.directory).await?;
        Ok(tenant.map(|t| t.id))
    }

    /// Recomputed per request; never fails for non-elevated identities.
    pub async fn context_view(
        &self,
        identity: Option<&Identity>,
    ) -> Result<TenantContextView, TenancyError> {
        let Some(identity) = identity.filter(|i| i.elevated) else {
            return Ok(TenantContextView::default());
        };

        let tenant = self.selection(identity).resolve(self.directory).await?;
        Ok(TenantContextView {
            can_select: true,
            active_tenant_id: tenant.as_ref().map(|t| t.id.clone()),
            active_tenant: tenant.as_ref().map(|t| t.summary()),
        })
    }

    pub async fn shared_state(
        &self,
        identity: Option<&Identity>,
        scope: Option<&SecurityContext>,
    ) -> Result<SharedState, TenancyError> {
        Ok(SharedState {
            tenant: scope.and_then(|s| s.tenant()).map(|t| t.record()),
            tenant_context: self.context_view(identity).await?,
        })
    }

    pub async fn view(&self, identity: Option<&Identity>) -> Result<SelectorView, TenancyError> {
        Ok(SelectorView {
            tenants: self.list(identity).await?,
            active_tenant_id: self.active_tenant_id(identity).await?,
            tenant_context: self.context_view(identity).await?,
        })
    }
}
