// handlers/public/mod.rs - Unauthenticated endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Matter API (Rust)",
            "version": version,
            "environment": format!("{:?}", state.config.environment),
            "description": "Multi-tenant matter management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "tenant_context": "/settings/tenant-context (super-admin)",
                "context": "/api/context (tenant)",
                "clients": "/api/clients[/:id] (tenant)",
                "matters": "/api/matters[/:id] (tenant)",
            }
        }
    }))
}

/// GET /health - storage connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = &state.pool else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
