//! Composite price estimator for one base asset on Binance spot
//!
//! # Architecture
//! - **core**: pairs, registry, trade ticks, startup discovery
//! - **hot_path**: tick routing, bridge cache, EMA, weighted composite
//! - **exchanges**: Binance parser and WebSocket client
//! - **ws**: connection and subscription plumbing
//! - **infrastructure**: config, logging, metrics, api
//!
//! Usage: `composite-price [BASE_ASSET]`

use anyhow::Context;
use composite_price::core::{PairDiscovery, PairRegistry};
use composite_price::engine::{pump_feed, AppEngine, PriceEngine, SharedEngine};
use composite_price::exchanges::BinanceWsClient;
use composite_price::infrastructure::logging::init_logging;
use composite_price::infrastructure::metrics::MetricsCollector;
use composite_price::infrastructure::{start_server, AppState};
use composite_price::{log_main, Config};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Main application
pub struct CompositeApp {
    config: Config,
}

impl CompositeApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Discover, subscribe and run until Ctrl-C or stream end
    pub async fn run(&self) -> anyhow::Result<SharedEngine> {
        let engine_config = &self.config.engine;
        log_main!(
            tracing::Level::INFO,
            "Starting composite price engine for {}/{}",
            engine_config.base_asset,
            engine_config.settlement_asset
        );

        // 1. Discover target pairs and their volume weights (cold path)
        let discovery = PairDiscovery::new(&self.config.feed)?;
        let pairs = discovery
            .fetch_target_pairs(
                &engine_config.base_asset,
                &engine_config.settlement_asset,
                engine_config.include_settlement_pair,
            )
            .await
            .context("pair discovery failed")?;

        let registry = Arc::new(
            PairRegistry::new(&engine_config.settlement_asset, pairs)
                .context("invalid pair set")?,
        );

        let weights = discovery
            .fetch_volume_weights(&registry)
            .await
            .context("volume weight lookup failed")?;

        // 2. Engine state
        let metrics = Arc::new(MetricsCollector::new());
        let engine = PriceEngine::new(registry.clone(), weights, self.config.tau(), metrics.clone());
        let app_engine = AppEngine::new(engine);
        let shared = app_engine.shared();

        // 3. API server (optional)
        if self.config.api.enabled {
            let state = AppState {
                engine: shared.clone(),
                metrics: metrics.clone(),
            };
            let api_config = self.config.api.clone();
            tokio::spawn(async move {
                if let Err(e) = start_server(state, &api_config).await {
                    tracing::error!("API Server failed: {}", e);
                }
            });
        }

        // 4. Feed
        let mut client = BinanceWsClient::new(&self.config.feed);
        client.connect().await.context("connect failed")?;
        client.subscribe(&registry).await.context("subscribe failed")?;
        metrics.set_feed_connected(true);

        let (tx, rx) = mpsc::channel(engine_config.channel_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let feed_task = tokio::spawn(pump_feed(client, tx, shutdown_rx.clone(), metrics.clone()));

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });

        // 5. Consume until shutdown or end of stream
        let processed = app_engine.run(rx, shutdown_rx).await;

        match feed_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Feed stopped with error: {}", e),
            Err(e) => tracing::error!("Feed task failed: {}", e),
        }

        log_main!(tracing::Level::INFO, "Engine stopped after {} messages", processed);
        Ok(shared)
    }
}

/// Print the final composite and per-pair breakdown
fn report(engine: &SharedEngine) {
    let engine = engine.read();
    let snapshot = engine.snapshot();

    match &snapshot.composite {
        Some(composite) => {
            println!(
                "{} composite price: {:.6} {} ({} pairs)",
                snapshot.base, composite.value, snapshot.settlement, composite.pair_count
            );
            for pair in &composite.pairs {
                println!(
                    "  {:<12} ema {:>16.6}  weight {:>20.2}  share {:>6.2}%",
                    pair.symbol,
                    pair.ema,
                    pair.weight,
                    pair.share * 100.0
                );
            }
        }
        None => println!("{} composite price: no data", snapshot.base),
    }

    for pair in snapshot.pairs.iter().filter(|p| !p.tracking) {
        println!("  {:<12} uninitialized", pair.symbol);
    }

    let metrics = engine.metrics().snapshot();
    println!(
        "trades {} (ema {}, bridge {}, deferred {}, ignored {}), parse errors {}",
        metrics.trades,
        metrics.ema_updates,
        metrics.bridge_updates,
        metrics.deferred,
        metrics.ignored,
        metrics.parse_errors
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(base) = std::env::args().nth(1) {
        config = config.with_base_asset(&base);
        config.validate().context("invalid base asset")?;
    }

    // Guards flush the file appenders on drop
    let _guards = init_logging(&config.logging).context("failed to initialize logging")?;

    let app = CompositeApp::new(config);
    let engine = app.run().await?;
    report(&engine);

    Ok(())
}
