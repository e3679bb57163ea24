//! API configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

use core_kernel::SystemClock;
use domain_claims::WorkflowConfig;
use domain_warranty::ValidityWindow;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration, read from `API_`-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// HMAC secret for access tokens
    pub jwt_secret: String,
    pub admin_token_ttl_secs: u64,
    pub master_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    /// `<n>m` or `<n>d`
    pub warranty_validity: String,
    pub require_acknowledgment: bool,
    pub bind_warranty_on_create: bool,
    /// IANA zone that defines "today" for expiry checks
    pub business_timezone: String,
    pub request_timeout_secs: u64,
    pub notify_from: String,
    pub bootstrap_master_username: Option<String>,
    pub bootstrap_master_password: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/warranty".to_string(),
            db_max_connections: 10,
            jwt_secret: "change-me-in-production".to_string(),
            admin_token_ttl_secs: 7 * 24 * 3600,
            master_token_ttl_secs: 30 * 24 * 3600,
            refresh_token_ttl_secs: 60 * 24 * 3600,
            warranty_validity: "6m".to_string(),
            require_acknowledgment: true,
            bind_warranty_on_create: true,
            business_timezone: "Asia/Kuala_Lumpur".to_string(),
            request_timeout_secs: 30,
            notify_from: "no-reply@localhost".to_string(),
            bootstrap_master_username: None,
            bootstrap_master_password: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// `API_DATABASE_URL` and `API_JWT_SECRET` have no default and must be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("db_max_connections", 10)?
            .set_default("admin_token_ttl_secs", 7 * 24 * 3600)?
            .set_default("master_token_ttl_secs", 30 * 24 * 3600)?
            .set_default("refresh_token_ttl_secs", 60 * 24 * 3600)?
            .set_default("warranty_validity", "6m")?
            .set_default("require_acknowledgment", true)?
            .set_default("bind_warranty_on_create", true)?
            .set_default("business_timezone", "Asia/Kuala_Lumpur")?
            .set_default("request_timeout_secs", 30)?
            .set_default("notify_from", "no-reply@localhost")?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?
            .add_source(Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Message("API_DATABASE_URL must not be empty".to_string()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("API_JWT_SECRET must not be empty".to_string()));
        }
        for (key, ttl) in [
            ("API_ADMIN_TOKEN_TTL_SECS", self.admin_token_ttl_secs),
            ("API_MASTER_TOKEN_TTL_SECS", self.master_token_ttl_secs),
            ("API_REFRESH_TOKEN_TTL_SECS", self.refresh_token_ttl_secs),
            ("API_REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
        ] {
            if ttl == 0 {
                return Err(ConfigError::Message(format!("{} must be greater than zero", key)));
            }
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Message(
                "API_DB_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        if self.bootstrap_master_username.is_some() != self.bootstrap_master_password.is_some() {
            return Err(ConfigError::Message(
                "API_BOOTSTRAP_MASTER_USERNAME and API_BOOTSTRAP_MASTER_PASSWORD must be set together"
                    .to_string(),
            ));
        }
        self.validity_window()?;
        self.clock()?;
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validity_window(&self) -> Result<ValidityWindow, ConfigError> {
        self.warranty_validity
            .parse()
            .map_err(|e| ConfigError::Message(format!("API_WARRANTY_VALIDITY: {}", e)))
    }

    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        SystemClock::from_zone_name(&self.business_timezone)
            .map_err(|e| ConfigError::Message(format!("API_BUSINESS_TIMEZONE: {}", e)))
    }

    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig {
            requires_acknowledgment: self.require_acknowledgment,
            bind_warranty_on_create: self.bind_warranty_on_create,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Bootstrap master credentials, when both are configured
    pub fn bootstrap_master(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_master_username, &self.bootstrap_master_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
