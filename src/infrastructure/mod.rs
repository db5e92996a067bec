//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Configuration management
//! - Logging and metrics
//! - HTTP API

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

pub use api::{start_server, AppState};
