//! Volume-weighted composite price engine
//!
//! Streams trades for every pair of one base asset, converts each price into
//! the settlement currency through bridge pairs, keeps a time-decayed EMA per
//! pair and combines them into a single volume-weighted composite.

pub mod core;
pub mod engine;
pub mod exchanges;
pub mod hot_path;
pub mod infrastructure;
pub mod ws;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use engine::{AppEngine, PriceEngine, SharedEngine};
pub use infrastructure::config::{ApiConfig, Config, EngineConfig, FeedConfig};

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("REST API error: {0}")]
    RestApi(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<core::DiscoveryError> for CompositeError {
    fn from(e: core::DiscoveryError) -> Self {
        CompositeError::RestApi(e.to_string())
    }
}

impl From<core::RegistryError> for CompositeError {
    fn from(e: core::RegistryError) -> Self {
        CompositeError::Config(e.to_string())
    }
}

impl From<infrastructure::config::ConfigError> for CompositeError {
    fn from(e: infrastructure::config::ConfigError) -> Self {
        CompositeError::Config(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CompositeError>;
