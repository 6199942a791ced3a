use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_BACKEND_KIND: &str = "http";
const DEFAULT_BACKEND_URL: &str = "http://localhost:9100";
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Warehouse data API backend: "http" or "in-memory"
    #[serde(default = "default_backend_kind")]
    #[validate(custom = "validate_backend_kind")]
    pub backend_kind: String,

    /// Base URL of the warehouse data API
    #[serde(default = "default_backend_url")]
    #[validate(url)]
    pub backend_base_url: String,

    /// Service token sent as a bearer header on backend calls
    #[serde(default)]
    pub backend_api_token: Option<String>,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Runtime environment (development, staging, production)
    pub environment: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Seconds an untouched receive/put-away/scan session survives
    #[serde(default = "default_session_ttl")]
    #[validate(range(min = 60))]
    pub session_ttl_secs: u64,

    /// Interval between session sweeps
    #[serde(default = "default_sweep_interval")]
    #[validate(range(min = 10))]
    pub session_sweep_interval_secs: u64,

    /// Comma-separated list of allowed CORS origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

fn default_backend_kind() -> String {
    DEFAULT_BACKEND_KIND.to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_session_ttl() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SESSION_SWEEP_INTERVAL_SECS
}

fn validate_backend_kind(value: &str) -> Result<(), ValidationError> {
    match value {
        "http" | "in-memory" => Ok(()),
        _ => Err(ValidationError::new("backend_kind")),
    }
}

impl AppConfig {
    /// Minimal constructor used by tests and embedded setups.
    pub fn new(backend_kind: &str, host: &str, port: u16, environment: &str) -> Self {
        Self {
            backend_kind: backend_kind.to_string(),
            backend_base_url: default_backend_url(),
            backend_api_token: None,
            host: host.to_string(),
            port,
            environment: environment.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            session_ttl_secs: default_session_ttl(),
            session_sweep_interval_secs: default_sweep_interval(),
            cors_allowed_origins: None,
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn uses_in_memory_backend(&self) -> bool {
        self.backend_kind == "in-memory"
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Loads configuration from defaults, `config/<env>` files, and
/// `APP__`-prefixed environment variables, in that order of precedence.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("backend_kind", DEFAULT_BACKEND_KIND)?
        .set_default("backend_base_url", DEFAULT_BACKEND_URL)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Initializes the tracing subscriber. Honors RUST_LOG when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("receiving_gateway={},tower_http=debug", level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_passes_validation() {
        let cfg = AppConfig::new("in-memory", "127.0.0.1", 18080, "test");
        assert!(cfg.validate().is_ok());
        assert!(cfg.uses_in_memory_backend());
        assert!(cfg.is_development());
    }

    #[test]
    fn unknown_backend_kind_fails_validation() {
        let cfg = AppConfig::new("carrier-pigeon", "127.0.0.1", 18080, "test");
        assert!(cfg.validate().is_err());
    }
}
