use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::database::DatabaseError;

/// The elevated role. Its assignments are visible from every partition.
pub const SUPER_ADMIN: &str = "super-admin";

pub const PERMISSIONS: &[&str] = &[
    "view clients",
    "create clients",
    "edit clients",
    "delete clients",
    "view matters",
    "create matters",
    "edit matters",
    "delete matters",
    "view documents",
    "create documents",
    "edit documents",
    "delete documents",
    "approve documents",
    "manage users",
    "manage tenant",
];

/// Role catalog: (role, permissions). `super-admin` carries no explicit grants.
pub fn role_catalog() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (SUPER_ADMIN, Vec::new()),
        ("tenant-admin", PERMISSIONS.to_vec()),
        (
            "partner",
            vec![
                "view clients", "create clients", "edit clients",
                "view matters", "create matters", "edit matters",
                "view documents", "create documents", "edit documents", "approve documents",
                "manage users",
            ],
        ),
        (
            "associate",
            vec![
                "view clients", "create clients", "edit clients",
                "view matters", "create matters", "edit matters",
                "view documents", "create documents", "edit documents",
            ],
        ),
        ("client", vec!["view clients", "view matters", "view documents"]),
    ]
}

/// Key that role and permission lookups are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum PermissionPartition {
    #[default]
    Global,
    Tenant(String),
}

impl PermissionPartition {
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            PermissionPartition::Global => None,
            PermissionPartition::Tenant(id) => Some(id),
        }
    }
}

impl fmt::Display for PermissionPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionPartition::Global => write!(f, "global"),
            PermissionPartition::Tenant(id) => write!(f, "tenant:{}", id),
        }
    }
}

/// Users → roles (partitioned) and roles → permissions
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Create the role if missing and replace its permission set. Roles are always global.
    async fn sync_role(&self, role: &str, permissions: &[&str]) -> Result<(), DatabaseError>;

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: &str,
        partition: &PermissionPartition,
    ) -> Result<(), DatabaseError>;

    /// Roles assigned under `partition`, plus the elevated role wherever it was assigned.
    async fn roles_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError>;

    /// Permissions granted through `roles_for`.
    async fn permissions_for(
        &self,
        user_id: Uuid,
        partition: &PermissionPartition,
    ) -> Result<Vec<String>, DatabaseError>;

    /// Elevated role check, independent of any partition.
    async fn has_elevated_role(&self, user_id: Uuid) -> Result<bool, DatabaseError>;
}

/// Seed the permission catalog as global roles
pub async fn seed_roles(store: &dyn RoleStore) -> Result<(), DatabaseError> {
    for (role, permissions) in role_catalog() {
        store.sync_role(role, &permissions).await?;
    }
    Ok(())
}

/// Permission check against the active partition. Elevated identities hold every permission.
pub async fn can(
    store: &dyn RoleStore,
    user_id: Uuid,
    partition: &PermissionPartition,
    permission: &str,
) -> Result<bool, DatabaseError> {
    let roles = store.roles_for(user_id, partition).await?;
    if roles.iter().any(|r| r == SUPER_ADMIN) {
        return Ok(true);
    }
    let permissions = store.permissions_for(user_id, partition).await?;
    Ok(permissions.iter().any(|p| p == permission))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_admin_holds_every_permission() {
        let catalog = role_catalog();
        let (_, perms) = catalog.iter().find(|(r, _)| *r == "tenant-admin").unwrap();
        assert_eq!(perms.len(), PERMISSIONS.len());
    }

    #[test]
    fn client_role_is_read_only() {
        let catalog = role_catalog();
        let (_, perms) = catalog.iter().find(|(r, _)| *r == "client").unwrap();
        assert!(perms.iter().all(|p| p.starts_with("view ")));
    }

    #[test]
    fn partition_display() {
        assert_eq!(PermissionPartition::Global.to_string(), "global");
        assert_eq!(PermissionPartition::Tenant("t1".into()).to_string(), "tenant:t1");
        assert_eq!(PermissionPartition::Tenant("t1".into()).tenant_id(), Some("t1"));
    }
}
