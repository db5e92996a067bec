//! Core Application Engine
//!
//! `PriceEngine` owns all streaming state (bridge cache, EMA states, volume
//! weights) and applies feed messages one at a time. `AppEngine` runs it as
//! the single consumer of the feed channel while other tasks read snapshots
//! through the shared lock.

use crate::core::PairRegistry;
use crate::exchanges::parsing::{BinanceMessage, BinanceParser};
use crate::exchanges::traits::{FeedMessage, TradeFeed};
use crate::hot_path::{
    AggregateError, BridgePriceCache, CompositePrice, EmaEngine, PairStatus, TickOutcome,
    TickRouter, VolumeWeights, WeightedAggregator,
};
use crate::infrastructure::metrics::MetricsCollector;
use crate::Result;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Engine handle shared between the consumer loop and readers
pub type SharedEngine = Arc<RwLock<PriceEngine>>;

/// Streaming composite-price state
pub struct PriceEngine {
    router: TickRouter,
    bridge: BridgePriceCache,
    ema: EmaEngine,
    weights: VolumeWeights,
    metrics: Arc<MetricsCollector>,
}

impl PriceEngine {
    pub fn new(
        registry: Arc<PairRegistry>,
        weights: VolumeWeights,
        tau: Duration,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            router: TickRouter::new(registry),
            bridge: BridgePriceCache::new(),
            ema: EmaEngine::new(tau),
            weights,
            metrics,
        }
    }

    /// Apply one feed message in arrival order
    pub fn apply(&mut self, msg: FeedMessage) -> TickOutcome {
        let outcome = self.router.dispatch(msg, &mut self.bridge, &mut self.ema);
        self.metrics.record(&outcome);

        match &outcome {
            TickOutcome::Seeded { symbol, ema } => {
                tracing::info!("{} tracking, seeded at {:.6}", symbol, ema);
            }
            TickOutcome::Updated { symbol, ema } => {
                tracing::debug!("{} ema {:.6}", symbol, ema);
            }
            TickOutcome::BridgeUpdated { symbol, price } => {
                tracing::debug!("Bridge {} = {}", symbol, price);
            }
            TickOutcome::Deferred { symbol } => {
                tracing::debug!("{} deferred, bridge price not available yet", symbol);
            }
            TickOutcome::Ignored { symbol } => {
                tracing::debug!("Ignoring tick for unregistered symbol {}", symbol);
            }
            TickOutcome::Rejected(e) => {
                tracing::warn!("Dropping malformed message: {}", e);
            }
            TickOutcome::Acknowledged => {}
        }
        outcome
    }

    /// Decode and apply a raw exchange frame
    pub fn apply_raw(&mut self, data: &[u8]) -> TickOutcome {
        let msg = match BinanceParser::parse(data) {
            Ok(BinanceMessage::Trade(tick)) => FeedMessage::Trade(tick),
            Ok(_) => FeedMessage::Control,
            Err(e) => FeedMessage::Malformed(e),
        };
        self.apply(msg)
    }

    /// Volume-weighted composite of all tracking pairs
    pub fn composite(&self) -> std::result::Result<CompositePrice, AggregateError> {
        WeightedAggregator::composite(&self.ema, &self.weights)
    }

    pub fn state(&self, symbol: &str) -> PairStatus {
        self.ema.state(symbol)
    }

    pub fn registry(&self) -> &PairRegistry {
        self.router.registry()
    }

    pub fn weights(&self) -> &VolumeWeights {
        &self.weights
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Point-in-time view of bridges, pairs and the composite
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut bridges: Vec<BridgeSnapshot> = self
            .bridge
            .iter()
            .map(|(symbol, quote)| BridgeSnapshot {
                symbol: symbol.to_string(),
                price: quote.price,
                event_time: quote.event_time,
            })
            .collect();
        bridges.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let pairs = self
            .registry()
            .targets()
            .iter()
            .map(|target| {
                let state = self.ema.get(&target.symbol);
                PairSnapshot {
                    symbol: target.symbol.clone(),
                    quote: target.pair.quote().to_string(),
                    bridge: target.bridge_symbol.clone(),
                    tracking: state.is_some(),
                    ema: state.map(|s| s.ema),
                    last_update: state.map(|s| s.last_update),
                    updates: state.map(|s| s.updates).unwrap_or(0),
                    weight: self.weights.get(&target.symbol),
                }
            })
            .collect();

        EngineSnapshot {
            base: self.registry().base().to_string(),
            settlement: self.registry().settlement().to_string(),
            composite: self.composite().ok(),
            bridges,
            pairs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeSnapshot {
    pub symbol: String,
    pub price: f64,
    pub event_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSnapshot {
    pub symbol: String,
    pub quote: String,
    pub bridge: Option<String>,
    pub tracking: bool,
    pub ema: Option<f64>,
    pub last_update: Option<u64>,
    pub updates: u64,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub base: String,
    pub settlement: String,
    pub composite: Option<CompositePrice>,
    pub bridges: Vec<BridgeSnapshot>,
    /// In registry order
    pub pairs: Vec<PairSnapshot>,
}

/// Single-consumer engine loop
pub struct AppEngine {
    engine: SharedEngine,
}

impl AppEngine {
    pub fn new(engine: PriceEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn shared(&self) -> SharedEngine {
        self.engine.clone()
    }

    /// Consume messages until the channel closes or shutdown is signalled.
    /// Returns the number of messages applied. The engine stays queryable
    /// afterwards.
    pub async fn run(
        &self,
        mut rx: mpsc::Receiver<FeedMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        tracing::info!("Engine running. Processing messages...");
        let mut processed = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Shutdown requested after {} messages", processed);
                    break;
                }
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        self.engine.write().apply(msg);
                        processed += 1;
                    }
                    None => {
                        tracing::info!("Feed stream ended after {} messages", processed);
                        break;
                    }
                },
            }
        }
        processed
    }
}

/// Forward feed messages into the engine channel until the feed ends,
/// the engine goes away, or shutdown is signalled. The feed is closed on
/// every exit.
pub async fn pump_feed<F: TradeFeed>(
    mut feed: F,
    tx: mpsc::Sender<FeedMessage>,
    mut shutdown: watch::Receiver<bool>,
    metrics: Arc<MetricsCollector>,
) -> Result<()> {
    let name = feed.name();
    tracing::info!(target: "feed", "Started message loop for {}", name);

    let result = loop {
        let next = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => break Ok(()),
            next = feed.next_message() => next,
        };

        match next {
            Ok(Some(msg)) => {
                if tx.send(msg).await.is_err() {
                    // Receiver dropped
                    break Ok(());
                }
            }
            Ok(None) => {
                tracing::warn!(target: "feed", "{} stream ended", name);
                break Ok(());
            }
            Err(e) => {
                tracing::error!(target: "feed", "{} error: {}", name, e);
                break Err(e);
            }
        }
    };

    feed.close().await;
    metrics.set_feed_connected(false);
    result
}

/// Resolves once shutdown is `true`; never resolves if the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
