use axum::{middleware, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::models::{Client, Matter};
use crate::database::{MemoryBackend, PgBackend};
use crate::handlers::{public, settings, tenant};
use crate::middleware::{authenticate, initialize_tenant_context};
use crate::store::RecordBackend;
use crate::tenancy::{
    RoleStore, SessionStore, TenantContextSelector, TenantDirectory, TenantResolver, UserStore,
};

/// Shared handles for every request. Cloned per request; all members are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub clients: Arc<dyn RecordBackend<Client>>,
    pub matters: Arc<dyn RecordBackend<Matter>>,
    pub resolver: Arc<TenantResolver>,
    /// Present when running against Postgres; used by the health check.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wire every store to one backend and build the resolver chain from `config`.
    pub fn from_backend<B>(config: Arc<AppConfig>, backend: Arc<B>, pool: Option<PgPool>) -> Self
    where
        B: TenantDirectory
            + UserStore
            + RoleStore
            + SessionStore
            + RecordBackend<Client>
            + RecordBackend<Matter>
            + 'static,
    {
        let tenants: Arc<dyn TenantDirectory> = backend.clone();
        let resolver = Arc::new(TenantResolver::from_config(&config, tenants.clone()));

        Self {
            config,
            tenants,
            users: backend.clone(),
            roles: backend.clone(),
            sessions: backend.clone(),
            clients: backend.clone(),
            matters: backend,
            resolver,
            pool,
        }
    }

    pub fn memory(config: Arc<AppConfig>, backend: Arc<MemoryBackend>) -> Self {
        Self::from_backend(config, backend, None)
    }

    pub fn postgres(config: Arc<AppConfig>, pool: PgPool) -> Self {
        let backend = Arc::new(PgBackend::new(pool.clone()));
        Self::from_backend(config, backend, Some(pool))
    }

    pub fn selector(&self) -> TenantContextSelector<'_> {
        TenantContextSelector::new(
            self.tenants.as_ref(),
            self.sessions.as_ref(),
            self.config.tenancy.session_key(),
        )
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Authenticated, outside any tenant
        .merge(settings_routes())
        // Authenticated, inside the resolved tenant
        .merge(tenant_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state.clone());

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings/tenant-context",
        get(settings::tenant_context_edit)
            .put(settings::tenant_context_update)
            .delete(settings::tenant_context_destroy),
    )
}

fn tenant_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/context", get(tenant::context_show))
        .route(
            "/api/clients",
            get(tenant::clients_index).post(tenant::clients_store),
        )
        .route(
            "/api/clients/:id",
            get(tenant::clients_show).delete(tenant::clients_destroy),
        )
        .route(
            "/api/matters",
            get(tenant::matters_index).post(tenant::matters_store),
        )
        .route(
            "/api/matters/:id",
            get(tenant::matters_show).delete(tenant::matters_destroy),
        )
        .route_layer(middleware::from_fn_with_state(state, initialize_tenant_context))
}
