use sqlx::PgPool;
use tracing::info;

use crate::database::DatabaseError;

/// Schema statements, applied in order inside one transaction. Every statement is idempotent.
const SCHEMA: &[(&str, &str)] = &[
    (
        "tenants",
        "CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            logo_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        "domains",
        "CREATE TABLE IF NOT EXISTS domains (
            id BIGSERIAL PRIMARY KEY,
            domain TEXT NOT NULL UNIQUE,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE ON UPDATE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            tenant_id TEXT REFERENCES tenants(id) ON DELETE CASCADE ON UPDATE CASCADE,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        "roles",
        "CREATE TABLE IF NOT EXISTS roles (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    ),
    (
        "permissions",
        "CREATE TABLE IF NOT EXISTS permissions (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    ),
    (
        "role_has_permissions",
        "CREATE TABLE IF NOT EXISTS role_has_permissions (
            role_id BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            permission_id BIGINT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
            PRIMARY KEY (role_id, permission_id)
        )",
    ),
    (
        "model_has_roles",
        "CREATE TABLE IF NOT EXISTS model_has_roles (
            role_id BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tenant_id TEXT REFERENCES tenants(id) ON DELETE CASCADE ON UPDATE CASCADE
        )",
    ),
    (
        "model_has_roles_unique",
        "CREATE UNIQUE INDEX IF NOT EXISTS model_has_roles_unique
            ON model_has_roles (role_id, user_id, COALESCE(tenant_id, ''))",
    ),
    (
        "sessions",
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id UUID NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (session_id, key)
        )",
    ),
    (
        "clients",
        "CREATE TABLE IF NOT EXISTS clients (
            id BIGSERIAL PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE ON UPDATE CASCADE,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            company TEXT,
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        "clients_tenant_idx",
        "CREATE INDEX IF NOT EXISTS clients_tenant_idx ON clients (tenant_id)",
    ),
    (
        "clients_tenant_email_unique",
        "CREATE UNIQUE INDEX IF NOT EXISTS clients_tenant_email_unique
            ON clients (tenant_id, email) WHERE email IS NOT NULL",
    ),
    (
        "matters",
        "CREATE TABLE IF NOT EXISTS matters (
            id BIGSERIAL PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE ON UPDATE CASCADE,
            client_id BIGINT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            reference_number TEXT,
            status TEXT NOT NULL DEFAULT 'open',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        "matters_tenant_idx",
        "CREATE INDEX IF NOT EXISTS matters_tenant_idx ON matters (tenant_id)",
    ),
];

/// Apply the schema to the shared database
pub async fn run(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("{}: {}", name, e)))?;
        info!("Applied schema step '{}'", name);
    }
    tx.commit().await?;
    Ok(())
}
