use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::{CommandContext, OutputFormat};
use crate::tenancy::UserStore;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id")]
    pub user: Uuid,

    #[arg(long, help = "Reuse an existing session instead of starting a new one")]
    pub session: Option<Uuid>,
}

pub async fn handle(args: TokenArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let backend = ctx.backend().await?;
    if backend.find_user(args.user).await?.is_none() {
        anyhow::bail!("User {} not found", args.user);
    }

    let expiry_hours = ctx.config.security.jwt_expiry_hours;
    let claims = match args.session {
        Some(session_id) => Claims::new(args.user, session_id, expiry_hours),
        None => Claims::new_session(args.user, expiry_hours),
    };
    let token = generate_jwt(&claims, &ctx.config.security.jwt_secret)?;

    match ctx.output {
        OutputFormat::Json => output_success(
            ctx.output,
            "Token issued",
            Some(json!({ "token": token, "session_id": claims.sid, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
