use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_IGV_RATE: f64 = 0.18;
const DEFAULT_MIN_MARGIN: f64 = 10.0;
const DEFAULT_NORMAL_MARGIN: f64 = 20.0;
const DEFAULT_COMMISSION_PERCENTAGE: f64 = 5.0;
const DEFAULT_VALIDITY_DAYS: i64 = 15;
const DEFAULT_MAX_CATEGORY_DEPTH: usize = 32;
const DEFAULT_PRICE_DRIFT_TOLERANCE: f64 = 1.0;

/// Quotation engine configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct QuotationConfig {
    /// Tax rate applied to quotation lines (decimal, 0.18 = Peru IGV)
    #[serde(default = "default_igv_rate")]
    #[validate(custom = "validate_tax_rate")]
    pub default_tax_rate: f64,

    /// System fallback minimum margin percentage when no category sets one
    #[serde(default = "default_min_margin")]
    #[validate(custom = "validate_percentage")]
    pub default_min_margin: f64,

    /// System fallback normal margin percentage when no category sets one
    #[serde(default = "default_normal_margin")]
    #[validate(custom = "validate_percentage")]
    pub default_normal_margin: f64,

    /// Document-level margin floor applied when lines span multiple categories
    #[serde(default = "default_min_margin")]
    #[validate(custom = "validate_percentage")]
    pub global_min_margin: f64,

    /// Maximum category parent-chain depth before the walk is treated as cyclic
    #[serde(default = "default_max_category_depth")]
    pub max_category_depth: usize,

    /// Days a quotation stays valid when the request does not set valid_until
    #[serde(default = "default_validity_days")]
    pub default_validity_days: i64,

    /// Monetary figure seller commission is computed on: "margin", "subtotal" or "total"
    #[serde(default = "default_commission_basis")]
    #[validate(custom = "validate_commission_basis")]
    pub commission_basis: String,

    /// Commission percentage applied when the seller has no override
    #[serde(default = "default_commission_percentage")]
    #[validate(custom = "validate_percentage")]
    pub default_commission_percentage: f64,

    /// Price list consulted for warehouse-sourced lines
    pub default_price_list_id: uuid::Uuid,

    /// Supplier purchase-price drift (percent) tolerated at conversion time
    #[serde(default = "default_price_drift_tolerance")]
    #[validate(custom = "validate_percentage")]
    pub price_drift_tolerance: f64,
}

impl Default for QuotationConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: default_igv_rate(),
            default_min_margin: default_min_margin(),
            default_normal_margin: default_normal_margin(),
            global_min_margin: default_min_margin(),
            max_category_depth: default_max_category_depth(),
            default_validity_days: default_validity_days(),
            commission_basis: default_commission_basis(),
            default_commission_percentage: default_commission_percentage(),
            default_price_list_id: uuid::Uuid::nil(),
            price_drift_tolerance: default_price_drift_tolerance(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Quotation engine settings
    #[serde(default)]
    #[validate]
    pub quotation: QuotationConfig,
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_event_channel_capacity() -> usize {
    1024
}
fn default_igv_rate() -> f64 {
    DEFAULT_IGV_RATE
}
fn default_min_margin() -> f64 {
    DEFAULT_MIN_MARGIN
}
fn default_normal_margin() -> f64 {
    DEFAULT_NORMAL_MARGIN
}
fn default_max_category_depth() -> usize {
    DEFAULT_MAX_CATEGORY_DEPTH
}
fn default_validity_days() -> i64 {
    DEFAULT_VALIDITY_DAYS
}
fn default_commission_basis() -> String {
    "margin".to_string()
}
fn default_commission_percentage() -> f64 {
    DEFAULT_COMMISSION_PERCENTAGE
}
fn default_price_drift_tolerance() -> f64 {
    DEFAULT_PRICE_DRIFT_TOLERANCE
}

fn validate_tax_rate(rate: f64) -> Result<(), ValidationError> {
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(ValidationError::new("tax_rate_out_of_range"));
    }
    Ok(())
}

fn validate_percentage(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::new("percentage_out_of_range"));
    }
    Ok(())
}

fn validate_commission_basis(basis: &str) -> Result<(), ValidationError> {
    match basis {
        "margin" | "subtotal" | "total" => Ok(()),
        _ => Err(ValidationError::new("unknown_commission_basis")),
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("cotizador_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
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
        .set_default("database_url", "sqlite://cotizador.db?mode=rwc")?
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

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotation_defaults_match_peru_igv() {
        let cfg = QuotationConfig::default();
        assert_eq!(cfg.default_tax_rate, 0.18);
        assert_eq!(cfg.default_min_margin, 10.0);
        assert_eq!(cfg.default_normal_margin, 20.0);
        assert_eq!(cfg.commission_basis, "margin");
        assert_eq!(cfg.max_category_depth, 32);
    }

    #[test]
    fn commission_basis_rejects_unknown_values() {
        assert!(validate_commission_basis("margin").is_ok());
        assert!(validate_commission_basis("subtotal").is_ok());
        assert!(validate_commission_basis("total").is_ok());
        assert!(validate_commission_basis("revenue").is_err());
    }

    #[test]
    fn tax_rate_must_be_a_decimal_fraction() {
        assert!(validate_tax_rate(0.18).is_ok());
        assert!(validate_tax_rate(0.0).is_ok());
        assert!(validate_tax_rate(18.0).is_err());
        assert!(validate_tax_rate(-0.1).is_err());
    }
}
