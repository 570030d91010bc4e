use tracing::info;

use crate::database::models::{NewTenant, NewUser, Tenant, User};
use crate::database::DatabaseError;
use crate::tenancy::directory::{TenantDirectory, UserStore};
use crate::tenancy::roles::{seed_roles, PermissionPartition, RoleStore};

pub const DEMO_TENANT_ID: &str = "demo";
pub const DEMO_DOMAIN: &str = "demo.localhost";
pub const DEMO_ADMIN_EMAIL: &str = "admin@demo.localhost";

/// What `seed` created besides the role catalog
#[derive(Debug, Default)]
pub struct SeedReport {
    pub tenant: Option<Tenant>,
    pub admin: Option<User>,
}

/// Seed the role catalog, and optionally a demo tenant with a tenant-admin user.
///
/// Safe to run repeatedly: an existing demo tenant is left untouched.
pub async fn run(
    tenants: &dyn TenantDirectory,
    users: &dyn UserStore,
    roles: &dyn RoleStore,
    with_demo: bool,
) -> Result<SeedReport, DatabaseError> {
    seed_roles(roles).await?;
    info!("Seeded role catalog");

    if !with_demo {
        return Ok(SeedReport::default());
    }

    if tenants.tenant_exists(DEMO_TENANT_ID).await? {
        info!("Demo tenant already present, skipping");
        return Ok(SeedReport::default());
    }

    let tenant = tenants
        .create_tenant(NewTenant {
            id: DEMO_TENANT_ID.to_string(),
            name: "Demo Law Firm".to_string(),
            slug: DEMO_TENANT_ID.to_string(),
            logo_url: None,
        })
        .await?;

    if tenants.domain_table_available().await? {
        tenants.add_domain(&tenant.id, DEMO_DOMAIN).await?;
    }

    let admin = users
        .create_user(NewUser {
            tenant_id: Some(tenant.id.clone()),
            name: "Demo Admin".to_string(),
            email: DEMO_ADMIN_EMAIL.to_string(),
        })
        .await?;
    roles
        .assign_role(admin.id, "tenant-admin", &PermissionPartition::Tenant(tenant.id.clone()))
        .await?;

    info!("Seeded demo tenant '{}' with admin {}", tenant.id, admin.id);
    Ok(SeedReport {
        tenant: Some(tenant),
        admin: Some(admin),
    })
}
