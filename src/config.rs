//! Configuration management for Alpha Radar
//!
//! Every setting is environment-driven. Each section loads from its own
//! variable prefix (`TELEGRAM_*`, `DB_*`, `TRENDING_*`, ...) so deployments
//! configure the service with flat keys and no config file.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram transport credentials
    pub telegram: TelegramConfig,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Trending detection thresholds
    pub trending: TrendingConfig,
    /// Ingress message filters
    pub filters: FilterConfig,
    /// Optional Dexscreener liquidity validation
    pub dexscreener: DexscreenerConfig,
    /// Bot API token and alert target
    pub bot: BotConfig,
    /// Prometheus metrics surface
    pub metrics: MetricsConfig,
    /// Health check surface
    pub health: HealthConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// Telegram MTProto credentials (user session)
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Application id issued by my.telegram.org
    #[serde(default)]
    pub api_id: i64,
    /// Application hash issued by my.telegram.org
    #[serde(default)]
    pub api_hash: String,
    /// Phone number of the monitoring account
    #[serde(default)]
    pub phone: String,
    /// Session storage handle
    #[serde(default = "default_session_name")]
    pub session_name: String,
}

fn default_session_name() -> String {
    "alpha_radar".to_string()
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub name: String,
    /// Minimum connections kept in the pool
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,
    /// Maximum connections in the pool
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "radar".to_string()
}

fn default_db_name() -> String {
    "alpha_radar".to_string()
}

fn default_pool_min() -> u32 {
    2
}

fn default_pool_max() -> u32 {
    10
}

/// Trending detection thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingConfig {
    /// Sliding window length in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Minimum mentions inside the window
    #[serde(default = "default_min_mentions")]
    pub min_mentions: i64,
    /// Minimum distinct chats inside the window
    #[serde(default = "default_min_unique_chats")]
    pub min_unique_chats: i64,
    /// Per-contract alert cooldown in minutes
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
    /// Seconds between trending scans
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

fn default_window_minutes() -> i64 {
    5
}

fn default_min_mentions() -> i64 {
    3
}

fn default_min_unique_chats() -> i64 {
    2
}

fn default_cooldown_minutes() -> i64 {
    15
}

fn default_check_interval() -> u64 {
    30
}

/// Ingress message filters
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Drop messages shorter than this many characters
    #[serde(default = "default_min_msg_length")]
    pub min_msg_length: usize,
    /// Drop forwarded messages entirely
    #[serde(default)]
    pub ignore_forwarded: bool,
}

fn default_min_msg_length() -> usize {
    5
}

/// Optional Dexscreener liquidity validation
#[derive(Debug, Clone, Deserialize)]
pub struct DexscreenerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum pooled liquidity in USD
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: f64,
    #[serde(default = "default_dexscreener_api_url")]
    pub api_url: String,
}

fn default_min_liquidity() -> f64 {
    1000.0
}

fn default_dexscreener_api_url() -> String {
    "https://api.dexscreener.com/latest/dex/tokens".to_string()
}

/// Bot API settings shared by the listener and the notifier
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot token from @BotFather
    #[serde(default)]
    pub token: String,
    /// Chat that receives trending alerts
    #[serde(default)]
    pub alert_chat_id: String,
}

/// Prometheus metrics settings
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

/// Health check endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_port")]
    pub port: u16,
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_port() -> u16 {
    8080
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// `TELEGRAM_API_ID=12345` maps to `telegram.api_id`, `DB_POOL_MAX=10`
    /// to `database.pool_max`, and so on. Numeric and boolean values are
    /// type-cast during deserialization; a malformed value is a load error.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            telegram: section("TELEGRAM")?,
            database: section("DB")?,
            trending: section("TRENDING")?,
            filters: section("FILTER")?,
            dexscreener: section("DEXSCREENER")?,
            bot: section("BOT")?,
            metrics: section("METRICS")?,
            health: section("HEALTH")?,
            log: section("LOG")?,
        })
    }

    /// Validate that required settings are present.
    ///
    /// Runs before any connection is attempted; the caller aborts with a
    /// configuration failure when this returns an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<&str> = Vec::new();

        if self.telegram.api_id == 0 {
            errors.push("TELEGRAM_API_ID is required");
        }
        if self.telegram.api_hash.is_empty() {
            errors.push("TELEGRAM_API_HASH is required");
        }
        if self.telegram.phone.is_empty() {
            errors.push("TELEGRAM_PHONE is required");
        }
        if self.database.password.is_empty() {
            errors.push("DB_PASSWORD is required");
        }
        if self.bot.token.is_empty() {
            errors.push("BOT_TOKEN is required");
        }
        if self.bot.alert_chat_id.is_empty() {
            errors.push("BOT_ALERT_CHAT_ID is required");
        }
        if self.database.pool_min > self.database.pool_max {
            errors.push("DB_POOL_MIN must not exceed DB_POOL_MAX");
        }
        if self.trending.window_minutes <= 0 {
            errors.push("TRENDING_WINDOW_MINUTES must be positive");
        }
        if self.trending.check_interval == 0 {
            errors.push("TRENDING_CHECK_INTERVAL must be positive");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join("; ")))
        }
    }
}

fn section<T: serde::de::DeserializeOwned>(prefix: &str) -> Result<T, ConfigError> {
    Config::builder()
        .add_source(Environment::with_prefix(prefix))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_db_port(), 5432);
        assert_eq!(default_pool_min(), 2);
        assert_eq!(default_pool_max(), 10);
        assert_eq!(default_window_minutes(), 5);
        assert_eq!(default_min_mentions(), 3);
        assert_eq!(default_min_unique_chats(), 2);
        assert_eq!(default_cooldown_minutes(), 15);
        assert_eq!(default_check_interval(), 30);
        assert_eq!(default_min_msg_length(), 5);
        assert_eq!(default_metrics_port(), 9090);
        assert_eq!(default_health_port(), 8080);
        assert!(default_health_enabled());
    }

    #[test]
    fn test_validation_reports_missing_required_keys() {
        let config = AppConfig {
            telegram: TelegramConfig {
                api_id: 0,
                api_hash: String::new(),
                phone: String::new(),
                session_name: default_session_name(),
            },
            database: DatabaseConfig {
                host: default_db_host(),
                port: default_db_port(),
                user: default_db_user(),
                password: String::new(),
                name: default_db_name(),
                pool_min: default_pool_min(),
                pool_max: default_pool_max(),
            },
            trending: TrendingConfig {
                window_minutes: default_window_minutes(),
                min_mentions: default_min_mentions(),
                min_unique_chats: default_min_unique_chats(),
                cooldown_minutes: default_cooldown_minutes(),
                check_interval: default_check_interval(),
            },
            filters: FilterConfig {
                min_msg_length: default_min_msg_length(),
                ignore_forwarded: false,
            },
            dexscreener: DexscreenerConfig {
                enabled: false,
                min_liquidity: default_min_liquidity(),
                api_url: default_dexscreener_api_url(),
            },
            bot: BotConfig {
                token: String::new(),
                alert_chat_id: String::new(),
            },
            metrics: MetricsConfig {
                enabled: false,
                port: default_metrics_port(),
            },
            health: HealthConfig {
                enabled: default_health_enabled(),
                port: default_health_port(),
            },
            log: LogConfig {
                level: default_log_level(),
                json: false,
            },
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("TELEGRAM_API_ID"));
        assert!(err.contains("TELEGRAM_API_HASH"));
        assert!(err.contains("TELEGRAM_PHONE"));
        assert!(err.contains("DB_PASSWORD"));
        assert!(err.contains("BOT_TOKEN"));
    }
}
