//! Subscription manager for batched WebSocket subscriptions
//!
//! Builds `SUBSCRIBE` requests for every target pair and bridge pair trade
//! stream, batched per request, and tracks which batches the exchange confirmed.

use crate::core::PairRegistry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum streams per subscription request
pub const MAX_BATCH_SIZE: usize = 200;

/// Trade stream suffix
pub const TRADE_STREAM_SUFFIX: &str = "@trade";

/// Wire form of a subscription request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeRequest {
    pub fn subscribe(params: Vec<String>, id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params,
            id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Subscription request status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Request sent, waiting for confirmation
    Pending,
    /// Subscription confirmed by exchange
    Active,
    /// Exchange replied with an error
    Failed,
}

/// One request worth of streams
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub streams: Vec<String>,
    pub status: SubscriptionStatus,
}

/// Trade stream names for all targets and bridges, targets first
pub fn trade_streams(registry: &PairRegistry) -> Vec<String> {
    let targets = registry.targets().iter().map(|t| t.symbol.as_str());
    targets
        .chain(registry.bridge_symbols())
        .map(|symbol| format!("{}{}", symbol.to_lowercase(), TRADE_STREAM_SUFFIX))
        .collect()
}

/// Subscription manager keyed by request id
pub struct SubscriptionManager {
    batches: BTreeMap<u64, BatchRequest>,
    next_id: u64,
    batch_size: usize,
}

impl SubscriptionManager {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batches: BTreeMap::new(),
            next_id: 1,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Split streams into requests and register them as pending
    pub fn create_requests(&mut self, streams: &[String]) -> Vec<SubscribeRequest> {
        let mut requests = Vec::new();
        for chunk in streams.chunks(self.batch_size) {
            let id = self.next_id;
            self.next_id += 1;
            self.batches.insert(
                id,
                BatchRequest {
                    streams: chunk.to_vec(),
                    status: SubscriptionStatus::Pending,
                },
            );
            requests.push(SubscribeRequest::subscribe(chunk.to_vec(), id));
        }
        requests
    }

    /// Mark a request as confirmed. Returns false for unknown ids.
    pub fn confirm(&mut self, id: u64) -> bool {
        match self.batches.get_mut(&id) {
            Some(batch) => {
                batch.status = SubscriptionStatus::Active;
                true
            }
            None => false,
        }
    }

    /// Mark a request as rejected by the exchange
    pub fn mark_failed(&mut self, id: u64) -> bool {
        match self.batches.get_mut(&id) {
            Some(batch) => {
                batch.status = SubscriptionStatus::Failed;
                true
            }
            None => false,
        }
    }

    /// Number of streams in confirmed requests
    pub fn active_count(&self) -> usize {
        self.count_streams(SubscriptionStatus::Active)
    }

    /// Number of streams awaiting confirmation
    pub fn pending_count(&self) -> usize {
        self.count_streams(SubscriptionStatus::Pending)
    }

    fn count_streams(&self, status: SubscriptionStatus) -> usize {
        self.batches
            .values()
            .filter(|batch| batch.status == status)
            .map(|batch| batch.streams.len())
            .sum()
    }

    /// Forget all requests (after reconnect)
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new(MAX_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sol_registry;

    #[test]
    fn test_trade_streams_cover_targets_and_bridges() {
        let streams = trade_streams(&sol_registry());
        assert_eq!(
            streams,
            vec![
                "solbtc@trade",
                "soleth@trade",
                "solusdt@trade",
                "btcusdt@trade",
                "ethusdt@trade",
            ]
        );
    }

    #[test]
    fn test_request_wire_format() {
        let request = SubscribeRequest::subscribe(vec!["solbtc@trade".to_string()], 1);
        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"method": "SUBSCRIBE", "params": ["solbtc@trade"], "id": 1})
        );
    }

    #[test]
    fn test_batching_assigns_incrementing_ids() {
        let mut manager = SubscriptionManager::new(2);
        let streams = trade_streams(&sol_registry());
        let requests = manager.create_requests(&streams);

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].id, 1);
        assert_eq!(requests[2].id, 3);
        assert_eq!(requests[2].params, vec!["ethusdt@trade"]);
        assert_eq!(manager.pending_count(), 5);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_confirm_subscription() {
        let mut manager = SubscriptionManager::default();
        let streams = trade_streams(&sol_registry());
        let requests = manager.create_requests(&streams);
        assert_eq!(requests.len(), 1);

        assert_eq!(manager.pending_count(), 5);
        assert!(manager.confirm(1));
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(manager.active_count(), 5);
        assert!(!manager.confirm(42));
    }

    #[test]
    fn test_mark_failed() {
        let mut manager = SubscriptionManager::default();
        manager.create_requests(&["solbtc@trade".to_string()]);
        assert!(manager.mark_failed(1));
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(manager.active_count(), 0);
        assert!(!manager.mark_failed(2));
    }

    #[test]
    fn test_clear() {
        let mut manager = SubscriptionManager::default();
        manager.create_requests(&["solbtc@trade".to_string()]);
        manager.confirm(1);
        manager.clear();
        assert_eq!(manager.active_count(), 0);
        assert!(!manager.confirm(1));
    }
}
