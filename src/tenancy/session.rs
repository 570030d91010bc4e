use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::database::DatabaseError;
use crate::tenancy::directory::TenantDirectory;

/// Per-browser-session key/value storage. Concurrent writers race benignly (last write wins).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: Uuid, key: &str) -> Result<Option<String>, DatabaseError>;

    async fn put(&self, session_id: Uuid, key: &str, value: &str) -> Result<(), DatabaseError>;

    async fn forget(&self, session_id: Uuid, key: &str) -> Result<(), DatabaseError>;
}

/// The tenant selection stored in one session under the configured key
pub struct SessionSelection<'a> {
    store: &'a dyn SessionStore,
    session_id: Uuid,
    key: &'a str,
}

impl<'a> SessionSelection<'a> {
    pub fn new(store: &'a dyn SessionStore, session_id: Uuid, key: &'a str) -> Self {
        Self { store, session_id, key }
    }

    /// Stored tenant id; an empty value counts as no selection.
    pub async fn read(&self) -> Result<Option<String>, DatabaseError> {
        let value = self.store.get(self.session_id, self.key).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    pub async fn write(&self, tenant_id: &str) -> Result<(), DatabaseError> {
        self.store.put(self.session_id, self.key, tenant_id).await
    }

    pub async fn clear(&self) -> Result<(), DatabaseError> {
        self.store.forget(self.session_id, self.key).await
    }

    /// Stored selection resolved against the directory. A stale id is cleared from the session.
    pub async fn resolve(
        &self,
        directory: &dyn TenantDirectory,
    ) -> Result<Option<Tenant>, DatabaseError> {
        let Some(tenant_id) = self.read().await? else {
            return Ok(None);
        };

        match directory.find_tenant(&tenant_id).await? {
            Some(tenant) => Ok(Some(tenant)),
            None => {
                tracing::debug!("Clearing stale tenant selection '{}' from session", tenant_id);
                self.clear().await?;
                Ok(None)
            }
        }
    }
}
