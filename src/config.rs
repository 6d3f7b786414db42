use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";

/// Payment gateway merchant credentials. Each call carries a checksum built
/// from the merchant salt key and salt index.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PaymentGatewayConfig {
    pub base_url: String,
    #[validate(length(min = 1))]
    pub merchant_id: String,
    #[validate(length(min = 1))]
    pub salt_key: String,
    pub salt_index: u32,
    /// Public base URL the gateway redirects back to after payment.
    pub callback_base_url: String,
}

impl Default for PaymentGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.gateway.example".to_string(),
            merchant_id: "MERCHANTTEST".to_string(),
            salt_key: "test-salt-key".to_string(),
            salt_index: 1,
            callback_base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Shipping aggregator API credentials.
#[derive(Clone, Debug, Deserialize)]
pub struct ShippingConfig {
    pub base_url: String,
    pub api_email: String,
    pub api_password: String,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.courier.example/v1".to_string(),
            api_email: String::new(),
            api_password: String::new(),
        }
    }
}

/// Transactional mail provider settings.
#[derive(Clone, Debug, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mail.example/v3/send".to_string(),
            api_key: String::new(),
            from_address: "no-reply@loopwear.app".to_string(),
        }
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (Postgres in production, SQLite in tests).
    pub database_url: String,

    /// JWT signing secret for bearer tokens.
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: usize,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON (structured logging).
    #[serde(default)]
    pub log_json: bool,

    /// Run embedded migrations on startup.
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool sizing.
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Interval between scheduled sweep runs (boost expiry, stale carts).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Discount percentage on the thank-you coupon issued after settlement.
    #[serde(default = "default_purchase_coupon_percent")]
    pub purchase_coupon_percent: u32,

    /// Days until the thank-you coupon expires.
    #[serde(default = "default_purchase_coupon_valid_days")]
    pub purchase_coupon_valid_days: i64,

    /// Cart items older than this many days trigger a reminder.
    #[serde(default = "default_cart_reminder_days")]
    pub cart_reminder_days: i64,

    #[serde(default)]
    pub payment_gateway: PaymentGatewayConfig,

    #[serde(default)]
    pub shipping: ShippingConfig,

    #[serde(default)]
    pub mail: MailConfig,
}

fn default_jwt_expiration() -> usize {
    3600
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    "development".to_string()
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
fn default_sweep_interval_secs() -> u64 {
    300
}
fn default_purchase_coupon_percent() -> u32 {
    10
}
fn default_purchase_coupon_valid_days() -> i64 {
    3
}
fn default_cart_reminder_days() -> i64 {
    3
}

impl AppConfig {
    /// Minimal constructor used by tests and tooling.
    pub fn new(database_url: String, jwt_secret: String, host: String, port: u16) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration: default_jwt_expiration(),
            host,
            port,
            environment: "test".to_string(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            sweep_interval_secs: default_sweep_interval_secs(),
            purchase_coupon_percent: default_purchase_coupon_percent(),
            purchase_coupon_valid_days: default_purchase_coupon_valid_days(),
            cart_reminder_days: default_cart_reminder_days(),
            payment_gateway: PaymentGatewayConfig::default(),
            shipping: ShippingConfig::default(),
            mail: MailConfig::default(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads configuration from `config/default.toml` (if present), an
/// environment-specific overlay, and `LOOPWEAR__`-prefixed env vars.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder();

    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    if default_path.exists() {
        builder = builder.add_source(File::from(default_path));
    }
    let env_path = Path::new(CONFIG_DIR).join(format!("{environment}.toml"));
    if env_path.exists() {
        builder = builder.add_source(File::from(env_path));
    }

    builder = builder.add_source(Environment::with_prefix("LOOPWEAR").separator("__"));

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(environment = %environment, "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_is_valid() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "a-test-secret-that-is-long-enough-0123456789".into(),
            "127.0.0.1".into(),
            8080,
        );
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.purchase_coupon_percent, 10);
        assert_eq!(cfg.purchase_coupon_valid_days, 3);
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "short".into(),
            "127.0.0.1".into(),
            8080,
        );
        assert!(cfg.validate().is_err());
    }
}
