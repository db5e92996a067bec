//! Configuration management
//!
//! Loads configuration from config.toml at startup.
//! All values are configurable to avoid hardcoded constants.

use crate::core::discovery::REST_URL;
use crate::core::TradingPair;
use crate::exchanges::BinanceWsClient;
use crate::ws::subscription::MAX_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
///
/// Loaded from config.toml at startup. Every section falls back to its
/// defaults when omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Composite engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Asset whose composite price is estimated
    #[serde(default = "default_base_asset")]
    pub base_asset: String,

    /// Currency every pair price is converted into
    #[serde(default = "default_settlement_asset")]
    pub settlement_asset: String,

    /// EMA decay time constant in seconds
    #[serde(default = "default_tau_secs")]
    pub tau_secs: f64,

    /// Bounded capacity of the feed -> engine channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Also track BASE/SETTLEMENT itself as a target pair. Off by default:
    /// it usually carries most of the volume and would dominate the composite.
    #[serde(default)]
    pub include_settlement_pair: bool,
}

/// Exchange connectivity settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// Streams per SUBSCRIBE request (exchange caps this at 200)
    #[serde(default = "default_batch_size")]
    pub subscribe_batch_size: usize,

    /// Timeout for REST calls and the WebSocket handshake
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_true")]
    pub file_logging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_asset: default_base_asset(),
            settlement_asset: default_settlement_asset(),
            tau_secs: default_tau_secs(),
            channel_capacity: default_channel_capacity(),
            include_settlement_pair: false,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            subscribe_batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file_logging: true,
        }
    }
}

fn default_base_asset() -> String {
    "SOL".to_string()
}

fn default_settlement_asset() -> String {
    "USDT".to_string()
}

fn default_tau_secs() -> f64 {
    10.0
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_ws_url() -> String {
    BinanceWsClient::WS_URL.to_string()
}

fn default_rest_url() -> String {
    REST_URL.to_string()
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_request_timeout() -> u64 {
    10
}

fn default_api_port() -> u16 {
    5000
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    /// Load configuration from `$CONFIG_PATH` (default `config.toml`)
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be parsed or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{} not found, using defaults", config_path);
                Config::default()
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        // Same codes the registry will accept: alphanumeric, distinct
        TradingPair::new(&engine.base_asset, &engine.settlement_asset)
            .map_err(|e| ConfigError::Invalid(format!("engine assets: {}", e)))?;
        if !engine.tau_secs.is_finite() || engine.tau_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "engine.tau_secs must be finite and positive, got {}",
                engine.tau_secs
            )));
        }
        if engine.channel_capacity == 0 {
            return Err(ConfigError::Invalid("engine.channel_capacity must be > 0".to_string()));
        }
        if self.feed.subscribe_batch_size == 0 || self.feed.subscribe_batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid(format!(
                "feed.subscribe_batch_size must be in 1..={}, got {}",
                MAX_BATCH_SIZE, self.feed.subscribe_batch_size
            )));
        }
        if self.feed.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("feed.request_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Override the base asset (first CLI argument)
    pub fn with_base_asset(mut self, base: &str) -> Self {
        self.engine.base_asset = base.to_ascii_uppercase();
        self
    }

    #[inline]
    pub fn tau(&self) -> Duration {
        Duration::from_secs_f64(self.engine.tau_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
