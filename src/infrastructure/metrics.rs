//! Metrics collection for system monitoring
//!
//! Lock-free metrics counters using atomic operations.
//! Updated by the engine loop, exported via API and the shutdown report.

use crate::hot_path::TickOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

/// Engine metrics collector
///
/// Thread-safe counters updated from the engine loop.
/// Snapshots taken for API export.
pub struct MetricsCollector {
    /// Trade ticks for target pairs that reached the EMA engine
    ema_updates: AtomicU64,
    /// Trade ticks that overwrote a bridge price
    bridge_updates: AtomicU64,
    /// Target ticks dropped for lack of a bridge price
    deferred: AtomicU64,
    /// Trade ticks for symbols outside the registry
    ignored: AtomicU64,
    /// Subscription acks and other control frames
    acks: AtomicU64,
    /// Payloads that failed to decode
    parse_errors: AtomicU64,
    /// Feed connection status (0 = disconnected, 1 = connected)
    feed_connected: AtomicU64,
    /// Last message timestamp (Unix millis)
    last_message_time: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for API export
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub trades: u64,
    pub ema_updates: u64,
    pub bridge_updates: u64,
    pub deferred: u64,
    pub ignored: u64,
    pub acks: u64,
    pub parse_errors: u64,
    pub feed_connected: bool,
    pub message_rate: f64, // messages per second
    pub uptime_seconds: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            ema_updates: AtomicU64::new(0),
            bridge_updates: AtomicU64::new(0),
            deferred: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            acks: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            feed_connected: AtomicU64::new(0),
            last_message_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Count one dispatched message
    #[inline]
    pub fn record(&self, outcome: &TickOutcome) {
        let counter = match outcome {
            TickOutcome::Seeded { .. } | TickOutcome::Updated { .. } => &self.ema_updates,
            TickOutcome::BridgeUpdated { .. } => &self.bridge_updates,
            TickOutcome::Deferred { .. } => &self.deferred,
            TickOutcome::Ignored { .. } => &self.ignored,
            TickOutcome::Acknowledged => &self.acks,
            TickOutcome::Rejected(_) => &self.parse_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.update_last_message_time();
    }

    #[inline]
    fn update_last_message_time(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_message_time.store(now, Ordering::Relaxed);
    }

    pub fn set_feed_connected(&self, connected: bool) {
        let value = if connected { 1 } else { 0 };
        self.feed_connected.store(value, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.feed_connected.load(Ordering::Relaxed) != 0
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let ema_updates = self.ema_updates.load(Ordering::Relaxed);
        let bridge_updates = self.bridge_updates.load(Ordering::Relaxed);
        let deferred = self.deferred.load(Ordering::Relaxed);
        let ignored = self.ignored.load(Ordering::Relaxed);
        let acks = self.acks.load(Ordering::Relaxed);
        let parse_errors = self.parse_errors.load(Ordering::Relaxed);

        let trades = ema_updates + bridge_updates + deferred + ignored;
        let total = trades + acks + parse_errors;

        let uptime = self.start_time.elapsed().as_secs();
        let rate = if uptime > 0 {
            total as f64 / uptime as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            trades,
            ema_updates,
            bridge_updates,
            deferred,
            ignored,
            acks,
            parse_errors,
            feed_connected: self.is_connected(),
            message_rate: rate,
            uptime_seconds: uptime,
        }
    }

    /// Time since last message in milliseconds, capped at 10000ms
    pub fn latency_ms(&self) -> u64 {
        let last = self.last_message_time.load(Ordering::Relaxed);
        if last == 0 {
            return 10000; // No messages yet
        }

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        now.saturating_sub(last).min(10000)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::parsing::ParseError;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        let snapshot = collector.snapshot();

        assert_eq!(snapshot.trades, 0);
        assert_eq!(snapshot.parse_errors, 0);
        assert!(!snapshot.feed_connected);
    }

    #[test]
    fn test_record_outcomes() {
        let collector = MetricsCollector::new();
        let symbol = || "SOLBTC".to_string();

        collector.record(&TickOutcome::Seeded { symbol: symbol(), ema: 1.0 });
        collector.record(&TickOutcome::Updated { symbol: symbol(), ema: 1.0 });
        collector.record(&TickOutcome::BridgeUpdated { symbol: "BTCUSDT".to_string(), price: 1.0 });
        collector.record(&TickOutcome::Deferred { symbol: symbol() });
        collector.record(&TickOutcome::Ignored { symbol: "DOGEUSDT".to_string() });
        collector.record(&TickOutcome::Acknowledged);
        collector.record(&TickOutcome::Rejected(ParseError::NotAnObject));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.ema_updates, 2);
        assert_eq!(snapshot.bridge_updates, 1);
        assert_eq!(snapshot.deferred, 1);
        assert_eq!(snapshot.ignored, 1);
        assert_eq!(snapshot.trades, 5);
        assert_eq!(snapshot.acks, 1);
        assert_eq!(snapshot.parse_errors, 1);
        assert!(collector.latency_ms() < 10000);
    }

    #[test]
    fn test_connection_status() {
        let collector = MetricsCollector::new();
        collector.set_feed_connected(true);
        assert!(collector.snapshot().feed_connected);
        collector.set_feed_connected(false);
        assert!(!collector.is_connected());
    }

    #[test]
    fn test_latency_no_messages() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.latency_ms(), 10000);
    }
}
