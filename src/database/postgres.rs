use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{
    Client, Matter, NewClient, NewMatter, NewTenant, NewUser, Tenant, User,
};
use crate::database::DatabaseError;
use crate::store::RecordBackend;
use crate::tenancy::directory::{TenantDirectory, UserStore};
use crate::tenancy::roles::{PermissionPartition, RoleStore, SUPER_ADMIN};
use crate::tenancy::scope::TenantKey;
use crate::tenancy::session::SessionStore;

const TENANT_COLUMNS: &str = "id, name, slug, logo_url, created_at, updated_at";
const USER_COLUMNS: &str = "id, tenant_id, name, email, created_at, updated_at";
const CLIENT_COLUMNS: &str =
    "id, tenant_id, name, email, phone, company, notes, created_at, updated_at";
const MATTER_COLUMNS: &str =
    "id, tenant_id, client_id, title, description, reference_number, status, created_at, updated_at";

/// Backend over the shared Postgres database
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenantDirectory for PgBackend {
    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, DatabaseError> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE id = $1",
            TENANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants ORDER BY name ASC",
            TENANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, DatabaseError> {
        sqlx::query_as::<_, Tenant>(&format!(
            "INSERT INTO tenants (id, name, slug, logo_url) VALUES ($1, $2, $3, $4) RETURNING {}",
            TENANT_COLUMNS
        ))
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.logo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("tenant '{}'", tenant.id)))
    }

    async fn delete_tenant(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_domain(&self, tenant_id: &str, domain: &str) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO domains (domain, tenant_id) VALUES ($1, $2)")
            .bind(domain)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("domain '{}'", domain)))?;
        Ok(())
    }

    async fn domain_table_available(&self) -> Result<bool, DatabaseError> {
        let (available,): (bool,) =
            sqlx::query_as("SELECT to_regclass('public.domains') IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(available)
    }

    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError> {
        debug!("Looking up tenant for domain '{}'", domain);
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT t.id, t.name, t.slug, t.logo_url, t.created_at, t.updated_at \
             FROM domains d JOIN tenants t ON t.id = d.tenant_id \
             WHERE d.domain = $1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }
}

#[async_trait]
impl UserStore for PgBackend {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, tenant_id, name, email) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.tenant_id)
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("user '{}'", user.email)))
    }
}

#[async_trait]
impl RoleStore for PgBackend {
    async fn sync_role(&self, role: &str, permissions: &[&str]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (role_id,): (i64,) = sqlx::query_as(
            "INSERT INTO roles (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM role_has_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for permission in permissions {
            let (permission_id,): (i64,) = sqlx::query_as(
                "INSERT INTO permissions (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
            )
            .bind(*permission)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO role_has_permissions (role_id, permission_id) VALUES ($1, $2)")
                .bind(role_id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: &str,
        partition: &PermissionPartition,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO model_has_roles (role_id, user_id, tenant_id) \
             SELECT r.id, $2, $3 FROM roles r WHERE r.name = $1 \
             ON CONFLICT DO NOTHING",
        )
        .bind(role)
        .bind(user_id)
        .bind(partition.tenant_id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let (known,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;
            if !known {
                return Err(DatabaseError::NotFound(format!("role '{}'", role)));
            }
        }
        Ok(())
    }

    async fn roles_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT r.name FROM model_has_roles m JOIN roles r ON r.id = m.role_id \
             WHERE m.user_id = $1 AND (m.tenant_id IS NOT DISTINCT FROM $2 OR r.name = $3) \
             ORDER BY r.name",
        )
        .bind(user_id)
        .bind(partition.tenant_id())
        .bind(SUPER_ADMIN)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn permissions_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT p.name FROM model_has_roles m \
             JOIN roles r ON r.id = m.role_id \
             JOIN role_has_permissions rp ON rp.role_id = r.id \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE m.user_id = $1 AND (m.tenant_id IS NOT DISTINCT FROM $2 OR r.name = $3) \
             ORDER BY p.name",
        )
        .bind(user_id)
        .bind(partition.tenant_id())
        .bind(SUPER_ADMIN)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn has_elevated_role(&self, user_id: Uuid) -> Result<bool, DatabaseError> {
        let (elevated,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM model_has_roles m JOIN roles r ON r.id = m.role_id \
             WHERE m.user_id = $1 AND r.name = $2)",
        )
        .bind(user_id)
        .bind(SUPER_ADMIN)
        .fetch_one(&self.pool)
        .await?;
        Ok(elevated)
    }
}

#[async_trait]
impl SessionStore for PgBackend {
    async fn get(&self, session_id: Uuid, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM sessions WHERE session_id = $1 AND key = $2")
                .bind(session_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, session_id: Uuid, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (session_id, key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(session_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn forget(&self, session_id: Uuid, key: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1 AND key = $2")
            .bind(session_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordBackend<Client> for PgBackend {
    async fn all(&self, tenant: &TenantKey) -> Result<Vec<Client>, DatabaseError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE tenant_id = $1 ORDER BY id",
            CLIENT_COLUMNS
        ))
        .bind(tenant.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    async fn find(&self, tenant: &TenantKey, id: i64) -> Result<Option<Client>, DatabaseError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE tenant_id = $1 AND id = $2",
            CLIENT_COLUMNS
        ))
        .bind(tenant.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn insert(&self, tenant: &TenantKey, draft: NewClient) -> Result<Client, DatabaseError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (tenant_id, name, email, phone, company, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(tenant.as_str())
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.company)
        .bind(&draft.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "client email"))?;
        Ok(client)
    }

    async fn delete(&self, tenant: &TenantKey, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM clients WHERE tenant_id = $1 AND id = $2")
            .bind(tenant.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecordBackend<Matter> for PgBackend {
    async fn all(&self, tenant: &TenantKey) -> Result<Vec<Matter>, DatabaseError> {
        let matters = sqlx::query_as::<_, Matter>(&format!(
            "SELECT {} FROM matters WHERE tenant_id = $1 ORDER BY id",
            MATTER_COLUMNS
        ))
        .bind(tenant.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(matters)
    }

    async fn find(&self, tenant: &TenantKey, id: i64) -> Result<Option<Matter>, DatabaseError> {
        let matter = sqlx::query_as::<_, Matter>(&format!(
            "SELECT {} FROM matters WHERE tenant_id = $1 AND id = $2",
            MATTER_COLUMNS
        ))
        .bind(tenant.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(matter)
    }

    async fn insert(&self, tenant: &TenantKey, draft: NewMatter) -> Result<Matter, DatabaseError> {
        // The client must be owned by the same tenant; otherwise nothing is inserted.
        let matter = sqlx::query_as::<_, Matter>(&format!(
            "INSERT INTO matters (tenant_id, client_id, title, description, reference_number, status) \
             SELECT $1, c.id, $3, $4, $5, $6 FROM clients c WHERE c.id = $2 AND c.tenant_id = $1 \
             RETURNING {}",
            MATTER_COLUMNS
        ))
        .bind(tenant.as_str())
        .bind(draft.client_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.reference_number)
        .bind(&draft.status)
        .fetch_optional(&self.pool)
        .await?;

        matter.ok_or_else(|| DatabaseError::NotFound(format!("client {}", draft.client_id)))
    }

    async fn delete(&self, tenant: &TenantKey, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM matters WHERE tenant_id = $1 AND id = $2")
            .bind(tenant.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
