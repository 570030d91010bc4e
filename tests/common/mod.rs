#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use matter_api_rust::app::{app, AppState};
use matter_api_rust::auth::{generate_jwt, Claims};
use matter_api_rust::config::{AppConfig, Environment};
use matter_api_rust::database::models::{NewTenant, NewUser, Tenant, User};
use matter_api_rust::database::MemoryBackend;
use matter_api_rust::tenancy::roles::seed_roles;
use matter_api_rust::tenancy::{
    PermissionPartition, RoleStore, SessionStore, TenantDirectory, UserStore, SUPER_ADMIN,
};

pub const CENTRAL_DOMAIN: &str = "central.test";
pub const SESSION_KEY: &str = "active_tenant_id";

pub fn test_config(environment: Environment) -> AppConfig {
    let mut config = AppConfig::for_environment(environment);
    config.tenancy.central_domains = vec![CENTRAL_DOMAIN.to_string()];
    config.tenancy.domain_resolution = true;
    config.security.jwt_secret = "integration-secret".to_string();
    config.api.enable_request_logging = false;
    config
}

/// A signed-in user with their own browser session
#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    pub session_id: Uuid,
    pub token: String,
}

pub struct TestApp {
    pub backend: Arc<MemoryBackend>,
    pub config: Arc<AppConfig>,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config(Environment::Testing), MemoryBackend::new()).await
    }

    pub async fn in_environment(environment: Environment) -> Result<Self> {
        Self::with_config(test_config(environment), MemoryBackend::new()).await
    }

    pub async fn with_config(config: AppConfig, backend: MemoryBackend) -> Result<Self> {
        let backend = Arc::new(backend);
        seed_roles(&*backend).await?;

        let config = Arc::new(config);
        let router = app(AppState::memory(config.clone(), backend.clone()));
        Ok(Self {
            backend,
            config,
            router,
        })
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        AppState::memory(self.config.clone(), self.backend.clone())
            .resolver
            .strategy_names()
    }

    pub async fn tenant(&self, id: &str) -> Result<Tenant> {
        Ok(self
            .backend
            .create_tenant(NewTenant {
                id: id.to_string(),
                name: format!("Tenant {}", id.to_uppercase()),
                slug: format!("{}-firm", id),
                logo_url: Some(format!("https://cdn.test/{}.png", id)),
            })
            .await?)
    }

    pub async fn bind_domain(&self, tenant_id: &str, domain: &str) -> Result<()> {
        Ok(self.backend.add_domain(tenant_id, domain).await?)
    }

    async fn user(&self, home_tenant: Option<&str>) -> Result<User> {
        let email = format!("{}@users.test", Uuid::new_v4().simple());
        Ok(self
            .backend
            .create_user(NewUser {
                tenant_id: home_tenant.map(str::to_string),
                name: email.clone(),
                email,
            })
            .await?)
    }

    pub fn login(&self, user: User) -> Result<Login> {
        let claims = Claims::new_session(user.id, 1);
        let token = generate_jwt(&claims, &self.config.security.jwt_secret)?;
        Ok(Login {
            user,
            session_id: claims.sid,
            token,
        })
    }

    /// User whose home tenant is `tenant_id`, holding `role` in that tenant's partition.
    pub async fn tenant_user(&self, tenant_id: &str, role: &str) -> Result<Login> {
        let user = self.user(Some(tenant_id)).await?;
        self.backend
            .assign_role(user.id, role, &PermissionPartition::Tenant(tenant_id.to_string()))
            .await?;
        self.login(user)
    }

    /// User with a home tenant and no roles at all.
    pub async fn member(&self, tenant_id: Option<&str>) -> Result<Login> {
        let user = self.user(tenant_id).await?;
        self.login(user)
    }

    pub async fn super_admin(&self) -> Result<Login> {
        let user = self.user(None).await?;
        self.backend
            .assign_role(user.id, SUPER_ADMIN, &PermissionPartition::Global)
            .await?;
        self.login(user)
    }

    pub async fn select_in_session(&self, login: &Login, tenant_id: &str) -> Result<()> {
        Ok(self.backend.put(login.session_id, SESSION_KEY, tenant_id).await?)
    }

    pub async fn session_selection(&self, login: &Login) -> Result<Option<String>> {
        Ok(self.backend.get(login.session_id, SESSION_KEY).await?)
    }

    pub async fn send(&self, request: TestRequest) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request.build()?).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        Ok(TestResponse { status, body })
    }
}

pub struct TestRequest {
    method: Method,
    path: String,
    host: String,
    token: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            host: CENTRAL_DOMAIN.to_string(),
            token: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put(path: &str, body: Value) -> Self {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn auth(mut self, login: &Login) -> Self {
        self.token = Some(login.token.clone());
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn build(self) -> Result<Request<Body>> {
        let mut builder = Request::builder()
            .method(self.method)
            .uri(&self.path)
            .header(header::HOST, &self.host);

        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        Ok(request)
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "unexpected status, body: {}", self.body);
        self
    }

    /// The uniform tenant denial
    pub fn assert_tenant_denied(&self) {
        self.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(self.body["message"], "Tenant context is required for this request.");
    }
}
