//! Binance spot WebSocket client
//!
//! Subscribes to `<symbol>@trade` streams for every target and bridge pair and
//! turns text frames into `FeedMessage`s.

use crate::core::PairRegistry;
use crate::exchanges::parsing::{BinanceMessage, BinanceParser};
use crate::exchanges::traits::{FeedMessage, TradeFeed};
use crate::infrastructure::config::FeedConfig;
use crate::ws::connection::WebSocketConnection;
use crate::ws::subscription::{trade_streams, SubscriptionManager};
use crate::{CompositeError, Result};
use std::time::Duration;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Binance spot WebSocket client
pub struct BinanceWsClient {
    url: String,
    connect_timeout: Duration,
    connection: Option<WebSocketConnection>,
    subscriptions: SubscriptionManager,
}

impl BinanceWsClient {
    /// Binance spot WebSocket URL
    pub const WS_URL: &'static str = "wss://stream.binance.com:9443/ws";

    pub fn new(config: &FeedConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            connect_timeout: Duration::from_secs(config.request_timeout_secs),
            connection: None,
            subscriptions: SubscriptionManager::new(config.subscribe_batch_size),
        }
    }

    /// Connect to Binance WebSocket
    pub async fn connect(&mut self) -> Result<()> {
        tracing::info!(target: "feed", "Connecting to {}", self.url);
        let conn = WebSocketConnection::connect(&self.url, self.connect_timeout)
            .await
            .map_err(|e| CompositeError::WebSocket(e.to_string()))?;
        self.subscriptions.clear();
        self.connection = Some(conn);
        tracing::info!(target: "feed", "Connected");
        Ok(())
    }

    /// Subscribe to trade streams of all targets and bridges
    pub async fn subscribe(&mut self, registry: &PairRegistry) -> Result<()> {
        let streams = trade_streams(registry);
        let requests = self.subscriptions.create_requests(&streams);

        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| CompositeError::WebSocket("not connected".to_string()))?;

        for request in &requests {
            let text = request
                .to_json()
                .map_err(|e| CompositeError::Parse(e.to_string()))?;
            conn.send_text(&text)
                .await
                .map_err(|e| CompositeError::WebSocket(e.to_string()))?;
            tracing::debug!(target: "feed", "Sent subscription {}: {:?}", request.id, request.params);
        }

        tracing::info!(
            target: "feed",
            "Subscribed to {} streams in {} requests",
            streams.len(),
            requests.len()
        );
        Ok(())
    }

    /// Receive next feed message. `Ok(None)` when the socket is closed.
    pub async fn recv(&mut self) -> Result<Option<FeedMessage>> {
        let Some(conn) = self.connection.as_mut() else {
            return Ok(None);
        };

        loop {
            let msg = match conn.recv().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    self.connection = None;
                    return Ok(None);
                }
                Err(e) => {
                    self.connection = None;
                    return Err(CompositeError::WebSocket(e.to_string()));
                }
            };

            match msg {
                Message::Text(text) => return Ok(Some(self.handle_text(text.as_bytes()))),
                Message::Close(frame) => {
                    tracing::warn!(target: "feed", "Server closed stream: {:?}", frame);
                    self.connection = None;
                    return Ok(None);
                }
                // Ping/pong handled by the connection
                _ => continue,
            }
        }
    }

    fn handle_text(&mut self, data: &[u8]) -> FeedMessage {
        match BinanceParser::parse(data) {
            Ok(BinanceMessage::Trade(tick)) => FeedMessage::Trade(tick),
            Ok(BinanceMessage::SubscriptionResponse { id }) => {
                if let Some(id) = id {
                    if self.subscriptions.confirm(id) {
                        tracing::info!(
                            target: "feed",
                            "Subscription {} confirmed, {} streams still pending",
                            id,
                            self.subscriptions.pending_count()
                        );
                    }
                }
                FeedMessage::Control
            }
            Ok(BinanceMessage::ErrorResponse { id, code, msg }) => {
                if let Some(id) = id {
                    self.subscriptions.mark_failed(id);
                }
                tracing::error!(target: "feed", "Exchange error {} for request {:?}: {}", code, id, msg);
                FeedMessage::Control
            }
            Ok(BinanceMessage::OtherEvent(event)) => {
                tracing::debug!(target: "feed", "Ignoring {} event", event);
                FeedMessage::Control
            }
            Err(e) => FeedMessage::Malformed(e),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .map(|c| c.is_connected())
            .unwrap_or(false)
    }

    /// Streams confirmed by the exchange
    pub fn active_streams(&self) -> usize {
        self.subscriptions.active_count()
    }

    /// Close the socket
    pub async fn close(&mut self) {
        if self.is_connected() {
            tracing::info!(
                target: "feed",
                "Closing connection with {} active streams",
                self.active_streams()
            );
        }
        if let Some(mut conn) = self.connection.take() {
            let _ = conn.close().await;
        }
    }
}

impl TradeFeed for BinanceWsClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn next_message(&mut self) -> Result<Option<FeedMessage>> {
        self.recv().await
    }

    async fn close(&mut self) {
        BinanceWsClient::close(self).await
    }
}
