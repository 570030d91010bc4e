use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::database::models::{
    Client, Domain, Matter, NewClient, NewMatter, NewTenant, NewUser, Tenant, User,
};
use crate::database::DatabaseError;
use crate::store::RecordBackend;
use crate::tenancy::directory::{TenantDirectory, UserStore};
use crate::tenancy::roles::{PermissionPartition, RoleStore, SUPER_ADMIN};
use crate::tenancy::scope::TenantKey;
use crate::tenancy::session::SessionStore;

#[derive(Debug, Clone)]
struct Assignment {
    user_id: Uuid,
    role: String,
    tenant_id: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    tenants: BTreeMap<String, Tenant>,
    domains: Vec<Domain>,
    users: HashMap<Uuid, User>,
    roles: BTreeMap<String, BTreeSet<String>>,
    assignments: Vec<Assignment>,
    sessions: HashMap<(Uuid, String), String>,
    clients: Vec<Client>,
    matters: Vec<Matter>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process backend with the same constraints as the Postgres schema.
///
/// Used by `serve --memory` and the test suites.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    domain_table: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            domain_table: true,
        }
    }

    /// A backend whose domain mapping table was never migrated.
    pub fn without_domain_table() -> Self {
        Self {
            domain_table: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl TenantDirectory for MemoryBackend {
    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, DatabaseError> {
        Ok(self.tables.read().tenants.get(id).cloned())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let mut tenants: Vec<Tenant> = self.tables.read().tenants.values().cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }

    async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, DatabaseError> {
        let mut tables = self.tables.write();
        if tables.tenants.contains_key(&tenant.id) {
            return Err(DatabaseError::Conflict(format!("tenant '{}' already exists", tenant.id)));
        }
        if tables.tenants.values().any(|t| t.slug == tenant.slug) {
            return Err(DatabaseError::Conflict(format!("slug '{}' already exists", tenant.slug)));
        }

        let now = Utc::now();
        let created = Tenant {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
            logo_url: tenant.logo_url,
            created_at: now,
            updated_at: now,
        };
        tables.tenants.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn delete_tenant(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write();
        if tables.tenants.remove(id).is_none() {
            return Ok(false);
        }

        tables.domains.retain(|d| d.tenant_id != id);
        tables.clients.retain(|c| c.tenant_id != id);
        tables.matters.retain(|m| m.tenant_id != id);
        tables.assignments.retain(|a| a.tenant_id.as_deref() != Some(id));

        let orphaned: Vec<Uuid> = tables
            .users
            .values()
            .filter(|u| u.tenant_id.as_deref() == Some(id))
            .map(|u| u.id)
            .collect();
        for user_id in &orphaned {
            tables.users.remove(user_id);
        }
        tables.assignments.retain(|a| !orphaned.contains(&a.user_id));
        Ok(true)
    }

    async fn add_domain(&self, tenant_id: &str, domain: &str) -> Result<(), DatabaseError> {
        if !self.domain_table {
            return Err(DatabaseError::QueryError("relation \"domains\" does not exist".into()));
        }

        let mut tables = self.tables.write();
        if !tables.tenants.contains_key(tenant_id) {
            return Err(DatabaseError::NotFound(format!("tenant '{}'", tenant_id)));
        }
        if tables.domains.iter().any(|d| d.domain == domain) {
            return Err(DatabaseError::Conflict(format!("domain '{}' already exists", domain)));
        }

        let id = tables.next_id();
        tables.domains.push(Domain {
            id,
            domain: domain.to_string(),
            tenant_id: tenant_id.to_string(),
        });
        Ok(())
    }

    async fn domain_table_available(&self) -> Result<bool, DatabaseError> {
        Ok(self.domain_table)
    }

    async fn find_tenant_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError> {
        if !self.domain_table {
            return Err(DatabaseError::QueryError("relation \"domains\" does not exist".into()));
        }

        let tables = self.tables.read();
        Ok(tables
            .domains
            .iter()
            .find(|d| d.domain == domain)
            .and_then(|d| tables.tenants.get(&d.tenant_id))
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(format!("user '{}' already exists", user.email)));
        }
        if let Some(tenant_id) = &user.tenant_id {
            if !tables.tenants.contains_key(tenant_id) {
                return Err(DatabaseError::NotFound(format!("tenant '{}'", tenant_id)));
            }
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            tenant_id: user.tenant_id,
            name: user.name,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl RoleStore for MemoryBackend {
    async fn sync_role(&self, role: &str, permissions: &[&str]) -> Result<(), DatabaseError> {
        let set = permissions.iter().map(|p| p.to_string()).collect();
        self.tables.write().roles.insert(role.to_string(), set);
        Ok(())
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: &str,
        partition: &PermissionPartition,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write();
        if !tables.roles.contains_key(role) {
            return Err(DatabaseError::NotFound(format!("role '{}'", role)));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound(format!("user '{}'", user_id)));
        }
        let tenant_id = partition.tenant_id().map(str::to_string);
        if let Some(id) = &tenant_id {
            if !tables.tenants.contains_key(id) {
                return Err(DatabaseError::NotFound(format!("tenant '{}'", id)));
            }
        }

        let exists = tables
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.role == role && a.tenant_id == tenant_id);
        if !exists {
            tables.assignments.push(Assignment {
                user_id,
                role: role.to_string(),
                tenant_id,
            });
        }
        Ok(())
    }

    async fn roles_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError> {
        let tables = self.tables.read();
        let roles: BTreeSet<String> = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| a.role == SUPER_ADMIN || a.tenant_id.as_deref() == partition.tenant_id())
            .map(|a| a.role.clone())
            .collect();
        Ok(roles.into_iter().collect())
    }

    async fn permissions_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError> {
        let roles = self.roles_for(user_id, partition).await?;
        let tables = self.tables.read();
        let permissions: BTreeSet<String> = roles
            .iter()
            .filter_map(|role| tables.roles.get(role))
            .flatten()
            .cloned()
            .collect();
        Ok(permissions.into_iter().collect())
    }

    async fn has_elevated_role(&self, user_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self
            .tables
            .read()
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.role == SUPER_ADMIN))
    }
}

#[async_trait]
impl SessionStore for MemoryBackend {
    async fn get(&self, session_id: Uuid, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .sessions
            .get(&(session_id, key.to_string()))
            .cloned())
    }

    async fn put(&self, session_id: Uuid, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .sessions
            .insert((session_id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn forget(&self, session_id: Uuid, key: &str) -> Result<(), DatabaseError> {
        self.tables.write().sessions.remove(&(session_id, key.to_string()));
        Ok(())
    }
}

#[async_trait]
impl RecordBackend<Client> for MemoryBackend {
    async fn all(&self, tenant: &TenantKey) -> Result<Vec<Client>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .clients
            .iter()
            .filter(|c| c.tenant_id == tenant.as_str())
            .cloned()
            .collect())
    }

    async fn find(&self, tenant: &TenantKey, id: i64) -> Result<Option<Client>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .clients
            .iter()
            .find(|c| c.id == id && c.tenant_id == tenant.as_str())
            .cloned())
    }

    async fn insert(&self, tenant: &TenantKey, draft: NewClient) -> Result<Client, DatabaseError> {
        let mut tables = self.tables.write();
        if let Some(email) = &draft.email {
            let taken = tables
                .clients
                .iter()
                .any(|c| c.tenant_id == tenant.as_str() && c.email.as_ref() == Some(email));
            if taken {
                return Err(DatabaseError::Conflict(format!("client '{}' already exists", email)));
            }
        }
        let now = Utc::now();
        let client = Client {
            id: tables.next_id(),
            tenant_id: tenant.as_str().to_string(),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(client.clone());
        Ok(client)
    }

    async fn delete(&self, tenant: &TenantKey, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write();
        let before = tables.clients.len();
        tables.clients.retain(|c| !(c.id == id && c.tenant_id == tenant.as_str()));
        let removed = tables.clients.len() != before;
        if removed {
            tables.matters.retain(|m| m.client_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RecordBackend<Matter> for MemoryBackend {
    async fn all(&self, tenant: &TenantKey) -> Result<Vec<Matter>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .matters
            .iter()
            .filter(|m| m.tenant_id == tenant.as_str())
            .cloned()
            .collect())
    }

    async fn find(&self, tenant: &TenantKey, id: i64) -> Result<Option<Matter>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .matters
            .iter()
            .find(|m| m.id == id && m.tenant_id == tenant.as_str())
            .cloned())
    }

    async fn insert(&self, tenant: &TenantKey, draft: NewMatter) -> Result<Matter, DatabaseError> {
        let mut tables = self.tables.write();
        let client_in_scope = tables
            .clients
            .iter()
            .any(|c| c.id == draft.client_id && c.tenant_id == tenant.as_str());
        if !client_in_scope {
            return Err(DatabaseError::NotFound(format!("client {}", draft.client_id)));
        }

        let now = Utc::now();
        let matter = Matter {
            id: tables.next_id(),
            tenant_id: tenant.as_str().to_string(),
            client_id: draft.client_id,
            title: draft.title,
            description: draft.description,
            reference_number: draft.reference_number,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        tables.matters.push(matter.clone());
        Ok(matter)
    }

    async fn delete(&self, tenant: &TenantKey, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write();
        let before = tables.matters.len();
        tables.matters.retain(|m| !(m.id == id && m.tenant_id == tenant.as_str()));
        Ok(tables.matters.len() != before)
    }
}
