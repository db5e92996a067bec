//! Centralized file-based logging system
//!
//! Writes daily rolling logs under the configured directory:
//! - main/  - all logs, JSON
//! - error/ - warnings and errors only
//! - feed/  - WebSocket and exchange feed logs
//!
//! plus a console layer. Filter comes from `RUST_LOG`, default `info`.

use crate::infrastructure::config::LoggingConfig;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_TYPES: [&str; 3] = ["main", "error", "feed"];

/// Initialize logging
///
/// Returns the appender guards, which must be kept alive for the duration
/// of the program.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<Vec<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !config.file_logging {
        // try_init: a subscriber may already be installed (tests, embedding)
        let _ = tracing_subscriber::registry()
            .with(filter())
            .with(console_layer())
            .try_init();
        return Ok(Vec::new());
    }

    let logs_dir = config.dir.as_path();
    for log_type in LOG_TYPES {
        fs::create_dir_all(logs_dir.join(log_type))?;
    }

    let mut guards = Vec::new();

    let (main_appender, main_guard) = create_appender(logs_dir, "main");
    guards.push(main_guard);

    let (error_appender, error_guard) = create_appender(logs_dir, "error");
    guards.push(error_guard);

    let (feed_appender, feed_guard) = create_appender(logs_dir, "feed");
    guards.push(feed_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let feed_layer = tracing_subscriber::fmt::layer()
        .with_writer(feed_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| is_feed_target(metadata.target())));

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(main_layer)
        .with(error_layer)
        .with(feed_layer)
        .with(console_layer())
        .try_init();

    tracing::info!("Logging initialized. Log files in {}", logs_dir.display());

    Ok(guards)
}

/// Human-readable stderr output, built fresh for each subscriber stack
fn console_layer<S>() -> tracing_subscriber::fmt::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer().with_target(true).with_level(true)
}

/// Targets routed to the feed log
fn is_feed_target(target: &str) -> bool {
    target.contains("feed") || target.contains("ws") || target.contains("binance")
}

/// Create a daily rolling file appender in `<dir>/<name>/`
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Log to the `main` target
#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}
