use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::CommandContext;
use crate::database::models::NewUser;
use crate::tenancy::{PermissionPartition, RoleStore, UserStore, SUPER_ADMIN};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, help = "Home tenant id")]
        tenant: Option<String>,

        #[arg(long, help = "Role to assign in the home tenant's partition")]
        role: Option<String>,

        #[arg(long, help = "Grant the tenant-independent super-admin role")]
        super_admin: bool,
    },
}

pub async fn handle(cmd: UserCommands, ctx: &CommandContext) -> anyhow::Result<()> {
    let backend = ctx.backend().await?;

    match cmd {
        UserCommands::Create {
            email,
            name,
            tenant,
            role,
            super_admin,
        } => {
            let user = backend
                .create_user(NewUser {
                    tenant_id: tenant.clone(),
                    name,
                    email,
                })
                .await?;

            if let Some(role) = &role {
                let partition = match &tenant {
                    Some(id) => PermissionPartition::Tenant(id.clone()),
                    None => PermissionPartition::Global,
                };
                backend.assign_role(user.id, role, &partition).await?;
            }
            if super_admin {
                backend
                    .assign_role(user.id, SUPER_ADMIN, &PermissionPartition::Global)
                    .await?;
            }

            output_success(
                ctx.output,
                &format!("Created user {} ({})", user.id, user.email),
                Some(json!({
                    "id": user.id,
                    "tenant_id": user.tenant_id,
                    "role": role,
                    "super_admin": super_admin,
                })),
            )
        }
    }
}
