use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::CommandContext;
use crate::database::{migrations, seed};

pub async fn run_migrations(ctx: &CommandContext) -> anyhow::Result<()> {
    let backend = ctx.backend().await?;
    migrations::run(backend.pool()).await?;
    output_success(ctx.output, "Database schema is up to date", None)
}

pub async fn run_seed(demo: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let backend = ctx.backend().await?;
    let report = seed::run(&backend, &backend, &backend, demo).await?;

    let data = json!({
        "tenant": report.tenant.as_ref().map(|t| t.summary()),
        "admin_user_id": report.admin.as_ref().map(|u| u.id),
    });
    let message = match (&report.tenant, &report.admin) {
        (Some(tenant), Some(admin)) => format!(
            "Seeded roles and demo tenant '{}' (admin user {})",
            tenant.id, admin.id
        ),
        _ => "Seeded roles and permissions".to_string(),
    };
    output_success(ctx.output, &message, Some(data))
}
