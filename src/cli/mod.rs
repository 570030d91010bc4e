pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::{self, AppConfig};
use crate::database::{DatabaseManager, PgBackend};

#[derive(Parser)]
#[command(name = "matter-api-rust")]
#[command(about = "Multi-tenant matter management API and administration tool")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve(commands::server::ServeArgs),

    #[command(about = "Create or update the database schema")]
    Migrate,

    #[command(about = "Seed roles and permissions")]
    Seed {
        #[arg(long, help = "Also create a demo tenant with an admin user")]
        demo: bool,
    },

    #[command(about = "Tenant administration")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "User administration")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Mint a bearer token for a user")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Configuration plus lazily opened storage shared by every command
pub struct CommandContext {
    pub config: Arc<AppConfig>,
    pub output: OutputFormat,
}

impl CommandContext {
    pub async fn backend(&self) -> anyhow::Result<PgBackend> {
        let pool = DatabaseManager::connect(&self.config.database).await?;
        Ok(PgBackend::new(pool))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext {
        config: Arc::new(config::config().clone()),
        output: OutputFormat::from_cli(&cli),
    };

    match cli.command {
        Commands::Serve(args) => commands::server::handle(args, &ctx).await,
        Commands::Migrate => commands::database::run_migrations(&ctx).await,
        Commands::Seed { demo } => commands::database::run_seed(demo, &ctx).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &ctx).await,
        Commands::User { cmd } => commands::user::handle(cmd, &ctx).await,
        Commands::Token(args) => commands::token::handle(args, &ctx).await,
    }
}
