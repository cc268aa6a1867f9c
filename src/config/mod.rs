use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::entitlement::RemediationLinks;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub customer_cookie: String,
    pub admin_cookie: String,
    pub admin_email: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password_sha256: Option<String>,
    pub require_https: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub app_base_url: String,
    pub upgrade_path: String,
    pub renew_path: String,
    pub support_email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("WAGHL_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
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
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CUSTOMER_COOKIE") {
            self.security.customer_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_COOKIE") {
            self.security.admin_cookie = v;
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.security.admin_email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_SHA256") {
            self.security.admin_password_sha256 = Some(v.trim().to_ascii_lowercase());
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Billing overrides
        if let Ok(v) = env::var("APP_BASE_URL") {
            self.billing.app_base_url = v;
        }
        if let Ok(v) = env::var("BILLING_UPGRADE_PATH") {
            self.billing.upgrade_path = v;
        }
        if let Ok(v) = env::var("BILLING_RENEW_PATH") {
            self.billing.renew_path = v;
        }
        if let Ok(v) = env::var("SUPPORT_EMAIL") {
            self.billing.support_email = v;
        }

        self
    }

    /// Startup checks that would otherwise surface as per-request failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        self.remediation_links()?;
        Ok(())
    }

    pub fn remediation_links(&self) -> Result<RemediationLinks, ConfigError> {
        let base = Url::parse(&self.billing.app_base_url).map_err(|e| ConfigError::Invalid {
            key: "APP_BASE_URL",
            reason: e.to_string(),
        })?;
        RemediationLinks::new(
            &base,
            &self.billing.upgrade_path,
            &self.billing.renew_path,
            self.billing.support_email.clone(),
        )
        .map_err(|e| ConfigError::Invalid {
            key: "BILLING_UPGRADE_PATH/BILLING_RENEW_PATH",
            reason: e.to_string(),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                customer_cookie: "auth_token".to_string(),
                admin_cookie: "admin_token".to_string(),
                admin_email: None,
                admin_password_sha256: None,
                require_https: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            billing: BillingConfig {
                app_base_url: "http://localhost:3000".to_string(),
                upgrade_path: "/dashboard/upgrade".to_string(),
                renew_path: "/dashboard/billing".to_string(),
                support_email: "support@localhost".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.jwt_expiry_hours = 24;
        config.security.require_https = true;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.billing.app_base_url = "https://staging.example.com".to_string();
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.security.jwt_expiry_hours = 24;
        config.security.require_https = true;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.billing.app_base_url = "https://app.example.com".to_string();
        config.billing.support_email = "support@example.com".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert!(!config.security.require_https);
        assert_eq!(config.security.customer_cookie, "auth_token");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.require_https);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.security.jwt_expiry_hours, 24);
    }

    #[test]
    fn validate_requires_secret_and_base_url() {
        let mut config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));

        config.security.jwt_secret = "s3cret".into();
        assert!(config.validate().is_ok());

        config.billing.app_base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "APP_BASE_URL", .. })));
    }

    #[test]
    fn remediation_links_use_configured_paths() {
        let mut config = AppConfig::development();
        config.billing.app_base_url = "https://wa.example.io".into();
        config.billing.renew_path = "/billing/renew".into();
        let links = config.remediation_links().unwrap();
        assert_eq!(links.renew_url(), "https://wa.example.io/billing/renew");
        assert_eq!(links.upgrade_url(), "https://wa.example.io/dashboard/upgrade");
    }
}
