use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-ID";
pub const DEFAULT_SESSION_KEY: &str = "active_tenant_id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub tenancy: TenancyConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
}

impl Environment {
    /// Unset or unrecognised names are treated as production.
    fn from_name(name: Option<&str>) -> Self {
        let name = name.map(|n| n.trim().to_ascii_lowercase());
        match name.as_deref() {
            Some("development") | Some("dev") | Some("local") => Environment::Development,
            Some("testing") | Some("test") => Environment::Testing,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Production,
        }
    }

    /// Only local development and automated tests may identify a tenant by header.
    pub fn allows_header_fallback(self) -> bool {
        matches!(self, Environment::Development | Environment::Testing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Base domains whose subdomains name a tenant (`acme.central.test` -> `acme`).
    pub central_domains: Vec<String>,
    /// Whether a domain-to-tenant mapping table is configured at all.
    pub domain_resolution: bool,
    pub header: String,
    pub session_key: String,
}

impl TenancyConfig {
    pub fn header_name(&self) -> &str {
        if self.header.is_empty() {
            DEFAULT_TENANT_HEADER
        } else {
            &self.header
        }
    }

    pub fn session_key(&self) -> &str {
        if self.session_key.is_empty() {
            DEFAULT_SESSION_KEY
        } else {
            &self.session_key
        }
    }
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            central_domains: vec!["127.0.0.1".to_string(), "localhost".to_string()],
            domain_resolution: true,
            header: DEFAULT_TENANT_HEADER.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = Environment::from_name(env::var("APP_ENV").ok().as_deref());

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Testing => Self::testing(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_CENTRAL_DOMAINS") {
            self.tenancy.central_domains = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("TENANCY_DOMAIN_RESOLUTION") {
            self.tenancy.domain_resolution = v.parse().unwrap_or(self.tenancy.domain_resolution);
        }
        if let Ok(v) = env::var("TENANCY_HEADER") {
            self.tenancy.header = v;
        }
        if let Ok(v) = env::var("TENANCY_SESSION_KEY") {
            self.tenancy.session_key = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = env::var("MATTER_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            tenancy: TenancyConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            security: SecurityConfig {
                enable_cors: false,
                jwt_secret: "testing-secret".to_string(),
                jwt_expiry_hours: 1,
            },
            ..Self::development()
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            tenancy: TenancyConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            tenancy: TenancyConfig {
                central_domains: Vec::new(),
                ..TenancyConfig::default()
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.tenancy.header_name(), "X-Tenant-ID");
        assert_eq!(config.tenancy.session_key(), "active_tenant_id");
        assert!(config.environment.allows_header_fallback());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.environment.allows_header_fallback());
        assert!(config.tenancy.central_domains.is_empty());
    }

    #[test]
    fn staging_does_not_allow_header_fallback() {
        assert!(!Environment::Staging.allows_header_fallback());
        assert!(Environment::Testing.allows_header_fallback());
    }

    #[test]
    fn empty_header_and_session_key_fall_back_to_defaults() {
        let mut config = AppConfig::testing();
        config.tenancy.header = String::new();
        config.tenancy.session_key = String::new();
        assert_eq!(config.tenancy.header_name(), DEFAULT_TENANT_HEADER);
        assert_eq!(config.tenancy.session_key(), DEFAULT_SESSION_KEY);
    }

    #[test]
    fn environment_names_are_parsed() {
        assert_eq!(Environment::from_name(Some("prod")), Environment::Production);
        assert_eq!(Environment::from_name(Some("testing")), Environment::Testing);
        assert_eq!(Environment::from_name(Some("stage")), Environment::Staging);
        assert_eq!(Environment::from_name(Some("local")), Environment::Development);
        assert_eq!(Environment::from_name(Some(" Development ")), Environment::Development);
        assert_eq!(Environment::from_name(Some("TEST")), Environment::Testing);
    }

    #[test]
    fn unknown_or_missing_environment_disables_header_fallback() {
        for name in [None, Some("prd"), Some("live"), Some("PRODUCTION"), Some("")] {
            let environment = Environment::from_name(name);
            assert_eq!(environment, Environment::Production, "APP_ENV={:?}", name);
            assert!(!environment.allows_header_fallback(), "APP_ENV={:?}", name);
        }
    }
}
