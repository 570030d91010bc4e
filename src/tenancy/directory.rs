use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{NewTenant, NewUser, Tenant, User};
use crate::database::DatabaseError;

/// Persistent registry of tenants and their bound domains
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, DatabaseError>;

    async fn tenant_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.find_tenant(id).await?.is_some())
    }

    /// All tenants ordered by name ascending
    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError>;

    /// Fails with `Conflict` when the id or slug is already taken.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, DatabaseError>;

    /// Removes the tenant and every row it owns.
    async fn delete_tenant(&self, id: &str) -> Result<bool, DatabaseError>;

    async fn add_domain(&self, tenant_id: &str, domain: &str) -> Result<(), DatabaseError>;

    /// Whether the domain mapping table exists and can be queried.
    async fn domain_table_available(&self) -> Result<bool, DatabaseError>;

    /// `Ok(None)` means the domain is not bound to any tenant.
    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
}
