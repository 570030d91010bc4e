use clap::Args;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::{app, AppState};
use crate::cli::CommandContext;
use crate::database::{seed, DatabaseManager, MemoryBackend};
use crate::is_production;

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, help = "Use the in-process store (seeded with roles and a demo tenant)")]
    pub memory: bool,

    #[arg(long, help = "Override the configured port")]
    pub port: Option<u16>,
}

pub async fn handle(args: ServeArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let config = ctx.config.clone();

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }
    if is_production!() && args.memory {
        anyhow::bail!("The in-memory store cannot be used in production");
    }

    let state = if args.memory {
        warn!("Serving from the in-memory store; data is lost on exit");
        let backend = Arc::new(MemoryBackend::new());
        seed::run(&*backend, &*backend, &*backend, true).await?;
        AppState::memory(config.clone(), backend)
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        AppState::postgres(config.clone(), pool)
    };

    info!(
        "Starting Matter API in {:?} mode with strategies {:?}",
        config.environment,
        state.resolver.strategy_names()
    );

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Matter API listening on http://{}", bind_addr);

    let pool = state.pool.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        DatabaseManager::close(pool).await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
