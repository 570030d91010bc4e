use async_trait::async_trait;
use axum::http::{HeaderMap, Uri};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AppConfig, Environment};
use crate::database::models::Tenant;
use crate::database::DatabaseError;
use crate::tenancy::directory::TenantDirectory;
use crate::tenancy::error::TenancyError;
use crate::tenancy::identity::Identity;

/// Everything a strategy may look at for one request
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    /// Normalized request host (lower-case, no port).
    pub host: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub identity: Option<&'a Identity>,
    /// Tenant id stored in the session, already read once for this request.
    pub session_selection: Option<&'a str>,
}

/// One way of identifying the tenant for a request.
///
/// `Ok(None)` means "not applicable here, try the next strategy".
#[async_trait]
pub trait TenantStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_resolve(
        &self,
        request: &ResolutionRequest<'_>,
    ) -> Result<Option<Tenant>, DatabaseError>;
}

/// Host-to-tenant lookup through the domain mapping table
pub struct DomainStrategy {
    directory: Arc<dyn TenantDirectory>,
    central_domains: Vec<String>,
    enabled: bool,
}

impl DomainStrategy {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        central_domains: Vec<String>,
        enabled: bool,
    ) -> Self {
        Self {
            directory,
            central_domains,
            enabled,
        }
    }

    async fn table_available(&self) -> bool {
        match self.directory.domain_table_available().await {
            Ok(available) => available,
            Err(e) => {
                debug!("Domain table check failed, skipping domain resolution: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl TenantStrategy for DomainStrategy {
    fn name(&self) -> &'static str {
        "domain"
    }

    async fn try_resolve(
        &self,
        request: &ResolutionRequest<'_>,
    ) -> Result<Option<Tenant>, DatabaseError> {
        if !self.enabled || !self.table_available().await {
            return Ok(None);
        }
        let Some(host) = request.host else {
            return Ok(None);
        };

        for candidate in domain_candidates(host, &self.central_domains) {
            match self.directory.find_tenant_by_domain(&candidate).await {
                Ok(Some(tenant)) => return Ok(Some(tenant)),
                Ok(None) => continue,
                Err(e) => {
                    // A failing domain table stops domain probing for this request only.
                    warn!("Domain lookup for '{}' failed: {}", candidate, e);
                    return Ok(None);
                }
            }
        }

        Ok(None)
    }
}

/// The identity's home tenant
pub struct HomeTenantStrategy {
    directory: Arc<dyn TenantDirectory>,
}

impl HomeTenantStrategy {
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl TenantStrategy for HomeTenantStrategy {
    fn name(&self) -> &'static str {
        "home-tenant"
    }

    async fn try_resolve(
        &self,
        request: &ResolutionRequest<'_>,
    ) -> Result<Option<Tenant>, DatabaseError> {
        match request.identity.and_then(|i| i.home_tenant_id.as_deref()) {
            Some(tenant_id) => self.directory.find_tenant(tenant_id).await,
            None => Ok(None),
        }
    }
}

/// Tenant an elevated identity selected in its session
pub struct SessionSelectionStrategy {
    directory: Arc<dyn TenantDirectory>,
}

impl SessionSelectionStrategy {
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl TenantStrategy for SessionSelectionStrategy {
    fn name(&self) -> &'static str {
        "session-selection"
    }

    async fn try_resolve(
        &self,
        request: &ResolutionRequest<'_>,
    ) -> Result<Option<Tenant>, DatabaseError> {
        let elevated = request.identity.map(|i| i.elevated).unwrap_or(false);
        match request.session_selection.filter(|id| !id.is_empty()) {
            Some(tenant_id) if elevated => self.directory.find_tenant(tenant_id).await,
            _ => Ok(None),
        }
    }
}

/// Development/testing only: tenant id taken from a request header
pub struct HeaderFallbackStrategy {
    directory: Arc<dyn TenantDirectory>,
    header: String,
    environment: Environment,
}

impl HeaderFallbackStrategy {
    pub fn new(directory: Arc<dyn TenantDirectory>, header: &str, environment: Environment) -> Self {
        Self {
            directory,
            header: header.to_string(),
            environment,
        }
    }
}

#[async_trait]
impl TenantStrategy for HeaderFallbackStrategy {
    fn name(&self) -> &'static str {
        "header-fallback"
    }

    async fn try_resolve(
        &self,
        request: &ResolutionRequest<'_>,
    ) -> Result<Option<Tenant>, DatabaseError> {
        if !self.environment.allows_header_fallback() {
            return Ok(None);
        }

        let value = request
            .headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match value {
            Some(tenant_id) => self.directory.find_tenant(tenant_id).await,
            None => Ok(None),
        }
    }
}

/// Ordered strategy chain; the first strategy that yields a tenant wins
pub struct TenantResolver {
    strategies: Vec<Box<dyn TenantStrategy>>,
}

impl TenantResolver {
    pub fn new(strategies: Vec<Box<dyn TenantStrategy>>) -> Self {
        Self { strategies }
    }

    /// Domain → home tenant → session selection → header (development/testing only)
    pub fn from_config(config: &AppConfig, directory: Arc<dyn TenantDirectory>) -> Self {
        let tenancy = &config.tenancy;
        let mut strategies: Vec<Box<dyn TenantStrategy>> = vec![
            Box::new(DomainStrategy::new(
                directory.clone(),
                tenancy.central_domains.clone(),
                tenancy.domain_resolution,
            )),
            Box::new(HomeTenantStrategy::new(directory.clone())),
            Box::new(SessionSelectionStrategy::new(directory.clone())),
        ];

        if config.environment.allows_header_fallback() {
            strategies.push(Box::new(HeaderFallbackStrategy::new(
                directory,
                tenancy.header_name(),
                config.environment,
            )));
        }

        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<Tenant, TenancyError> {
        for strategy in &self.strategies {
            if let Some(tenant) = strategy.try_resolve(request).await? {
                debug!("Tenant '{}' resolved by {} strategy", tenant.id, strategy.name());
                return Ok(tenant);
            }
        }
        Err(TenancyError::NoTenantResolved)
    }
}

/// Full host first, then the subdomain left after stripping each central domain.
pub fn domain_candidates(host: &str, central_domains: &[String]) -> Vec<String> {
    let mut candidates = vec![host.to_string()];

    for central in central_domains.iter().filter(|d| !d.is_empty()) {
        let suffix = format!(".{}", central);
        if let Some(subdomain) = host.strip_suffix(suffix.as_str()) {
            if !subdomain.is_empty() && !candidates.iter().any(|c| c == subdomain) {
                candidates.push(subdomain.to_string());
            }
        }
    }

    candidates
}

/// Request host, lower-cased and without port. Absolute-form URIs take precedence over `Host`.
pub fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let raw = uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            headers
                .get(axum::http::header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })?;

    let parsed = url::Url::parse(&format!("http://{}", raw.trim())).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_ascii_lowercase())
}
