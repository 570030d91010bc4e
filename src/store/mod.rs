//! Data access for tenant-owned records.
//!
//! Backends only ever see a [`TenantKey`], which exists only while a tenant scope is
//! active. Callers go through [`ScopedRecords`], which takes the key from the request's
//! [`SecurityContext`], so there is no way to express an unscoped tenant-owned query.

use async_trait::async_trait;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::tenancy::scope::{ScopeError, SecurityContext, TenantKey};

/// A row tagged with its owning tenant
pub trait TenantOwned: Clone + Send + Sync + 'static {
    /// Insert payload. Carries no tenant id; the active scope supplies it.
    type Draft: Send + Sync + 'static;

    const TABLE: &'static str;

    fn id(&self) -> i64;

    fn tenant_id(&self) -> &str;
}

/// Storage for one tenant-owned entity type. Every operation is filtered or tagged by `tenant`.
#[async_trait]
pub trait RecordBackend<T: TenantOwned>: Send + Sync {
    async fn all(&self, tenant: &TenantKey) -> Result<Vec<T>, DatabaseError>;

    async fn find(&self, tenant: &TenantKey, id: i64) -> Result<Option<T>, DatabaseError>;

    async fn insert(&self, tenant: &TenantKey, draft: T::Draft) -> Result<T, DatabaseError>;

    async fn delete(&self, tenant: &TenantKey, id: i64) -> Result<bool, DatabaseError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Records of type `T` visible in the request's active tenant scope
pub struct ScopedRecords<'a, T: TenantOwned> {
    backend: &'a dyn RecordBackend<T>,
    scope: &'a SecurityContext,
}

impl<'a, T: TenantOwned> ScopedRecords<'a, T> {
    pub fn new(backend: &'a dyn RecordBackend<T>, scope: &'a SecurityContext) -> Self {
        Self { backend, scope }
    }

    pub async fn all(&self) -> Result<Vec<T>, StoreError> {
        let key = self.scope.tenant_key()?;
        Ok(self.backend.all(&key).await?)
    }

    pub async fn find(&self, id: i64) -> Result<Option<T>, StoreError> {
        let key = self.scope.tenant_key()?;
        Ok(self.backend.find(&key, id).await?)
    }

    /// Like `find`, but a record outside the scope is reported as not found.
    pub async fn find_or_not_found(&self, id: i64) -> Result<T, StoreError> {
        self.find(id).await?.ok_or_else(|| {
            StoreError::Database(DatabaseError::NotFound(format!(
                "{} record {} not found",
                T::TABLE,
                id
            )))
        })
    }

    pub async fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        let key = self.scope.tenant_key()?;
        Ok(self.backend.insert(&key, draft).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let key = self.scope.tenant_key()?;
        Ok(self.backend.delete(&key, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryBackend;
    use crate::database::models::{Client, NewClient, NewTenant, Tenant};
    use crate::tenancy::directory::TenantDirectory;

    fn draft(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            email: None,
            phone: None,
            company: None,
            notes: None,
        }
    }

    async fn tenant(backend: &MemoryBackend, id: &str) -> Tenant {
        backend
            .create_tenant(NewTenant {
                id: id.to_string(),
                name: id.to_string(),
                slug: id.to_string(),
                logo_url: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn queries_without_scope_fail_loudly() {
        let backend = MemoryBackend::new();
        let scope = SecurityContext::new();
        let clients: ScopedRecords<Client> = ScopedRecords::new(&backend, &scope);

        assert!(matches!(clients.all().await, Err(StoreError::Scope(ScopeError::NoActiveScope))));
        assert!(matches!(clients.create(draft("x")).await, Err(StoreError::Scope(_))));
    }

    #[tokio::test]
    async fn records_are_confined_to_active_tenant() {
        let backend = MemoryBackend::new();
        let t1 = tenant(&backend, "t1").await;
        let t2 = tenant(&backend, "t2").await;

        let scope = SecurityContext::new();
        let clients: ScopedRecords<Client> = ScopedRecords::new(&backend, &scope);

        let foreign_id = {
            let _guard = scope.enter(t1.clone());
            for name in ["a", "b", "c"] {
                clients.create(draft(name)).await.unwrap();
            }
            clients.all().await.unwrap()[0].id
        };

        {
            let _guard = scope.enter(t2);
            let created = clients.create(draft("d")).await.unwrap();
            assert_eq!(created.tenant_id, "t2");
            assert_eq!(clients.all().await.unwrap().len(), 1);
            assert!(clients.find(foreign_id).await.unwrap().is_none());
            assert!(!clients.delete(foreign_id).await.unwrap());
        }

        let _guard = scope.enter(t1);
        assert_eq!(clients.all().await.unwrap().len(), 3);
        assert!(clients.find_or_not_found(foreign_id).await.is_ok());
    }
}
