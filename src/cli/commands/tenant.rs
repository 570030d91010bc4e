use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::{CommandContext, OutputFormat};
use crate::database::models::NewTenant;
use crate::tenancy::TenantDirectory;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants")]
    List,

    #[command(about = "Create a tenant")]
    Create {
        #[arg(long, help = "Tenant id (never changes)")]
        id: String,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Unique slug")]
        slug: String,

        #[arg(long, help = "Logo URL")]
        logo_url: Option<String>,

        #[arg(long = "domain", help = "Domain bound to the tenant (repeatable)")]
        domains: Vec<String>,
    },

    #[command(about = "Delete a tenant and everything it owns")]
    Delete {
        #[arg(long, help = "Tenant id")]
        id: String,
    },
}

pub async fn handle(cmd: TenantCommands, ctx: &CommandContext) -> anyhow::Result<()> {
    let backend = ctx.backend().await?;

    match cmd {
        TenantCommands::List => {
            let tenants = backend.list_tenants().await?;
            if tenants.is_empty() {
                return output_empty_collection(ctx.output, "tenants", "No tenants");
            }

            match ctx.output {
                OutputFormat::Json => {
                    let summaries: Vec<_> = tenants.iter().map(|t| t.summary()).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "tenants": summaries }))?);
                }
                OutputFormat::Text => {
                    println!("{:<20} {:<20} {:<30} {}", "ID", "SLUG", "NAME", "CREATED");
                    println!("{}", "-".repeat(90));
                    for tenant in &tenants {
                        println!(
                            "{:<20} {:<20} {:<30} {}",
                            tenant.id,
                            tenant.slug,
                            tenant.name,
                            tenant.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
        TenantCommands::Create {
            id,
            name,
            slug,
            logo_url,
            domains,
        } => {
            let tenant = backend
                .create_tenant(NewTenant {
                    id,
                    name,
                    slug,
                    logo_url,
                })
                .await?;

            for domain in &domains {
                backend.add_domain(&tenant.id, &domain.to_ascii_lowercase()).await?;
            }

            output_success(
                ctx.output,
                &format!("Created tenant '{}'", tenant.id),
                Some(json!({ "tenant": tenant.summary(), "domains": domains })),
            )
        }
        TenantCommands::Delete { id } => {
            if !backend.delete_tenant(&id).await? {
                anyhow::bail!("Tenant '{}' not found", id);
            }
            output_success(ctx.output, &format!("Deleted tenant '{}'", id), None)
        }
    }
}
