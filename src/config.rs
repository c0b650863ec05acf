use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Minimum accepted length for the token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 16;

/// Signing secret committed in `config/dev.yaml`; only accepted when the
/// `dev` environment was selected explicitly
pub const SAMPLE_JWT_SECRET: &str = "dev-only-signing-secret-change-me";

/// Boot-time configuration problems. The service refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {0}: {1}")]
    Invalid(&'static str, String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "MISCONFIGURATION"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL for users and orders
    pub database_url: Option<String>,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "order_service.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig::default(),
            database_url: None,
            catalog: CatalogConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
        }
    }
}

/// Product catalog service connection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 5000,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    /// Allow `role` in the registration body to create admin accounts
    pub allow_role_on_register: bool,
    /// Accounts registered with one of these emails become admins
    pub admin_emails: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            allow_role_on_register: false,
            admin_emails: Vec::new(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("allow_role_on_register", &self.allow_role_on_register)
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

/// Validated settings the service needs at runtime
#[derive(Clone)]
pub struct RuntimeSettings {
    pub database_url: String,
    pub catalog_base_url: reqwest::Url,
    pub jwt_secret: String,
}

impl AppConfig {
    /// Load `config/{env}.yaml` if present, then apply environment overrides.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Environment variables win over the file. `lookup` is injected for tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").or_else(|| lookup("MONGO_URL")) {
            self.database_url = Some(url);
        }
        if let Some(url) = lookup("CATALOG_SERVICE_URL").or_else(|| lookup("PRODUCT_SERVICE_URL")) {
            self.catalog.base_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(port) = lookup("PORT") {
            self.gateway.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid("PORT", format!("'{}': {}", port, e)))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(emails) = lookup("ADMIN_EMAILS") {
            self.auth.admin_emails = emails
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Check required settings once at boot.
    ///
    /// `allow_sample_secret` is only set for an explicitly chosen `dev` env.
    pub fn validate(&self, allow_sample_secret: bool) -> Result<RuntimeSettings, ConfigError> {
        let database_url = non_empty(self.database_url.as_deref())
            .ok_or(ConfigError::Missing("database_url"))?
            .to_string();

        let base_url = non_empty(self.catalog.base_url.as_deref())
            .ok_or(ConfigError::Missing("catalog.base_url"))?;
        let catalog_base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ConfigError::Invalid("catalog.base_url", e.to_string()))?;
        if !matches!(catalog_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "catalog.base_url",
                format!("unsupported scheme '{}'", catalog_base_url.scheme()),
            ));
        }
        if self.catalog.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "catalog.timeout_ms",
                "must be greater than zero".to_string(),
            ));
        }

        let jwt_secret = non_empty(self.auth.jwt_secret.as_deref())
            .ok_or(ConfigError::Missing("auth.jwt_secret"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret",
                format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            ));
        }
        if jwt_secret == SAMPLE_JWT_SECRET && !allow_sample_secret {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret",
                "the sample secret is only accepted with an explicit dev env; set JWT_SECRET"
                    .to_string(),
            ));
        }

        Ok(RuntimeSettings {
            database_url,
            catalog_base_url,
            jwt_secret: jwt_secret.to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
