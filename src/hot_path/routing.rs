//! Tick router
//!
//! Classifies each feed message against the pair registry and hands it to
//! the bridge cache or the EMA engine. Order of arrival is preserved since a
//! single caller drives `dispatch`.

use crate::core::PairRegistry;
use crate::exchanges::parsing::ParseError;
use crate::exchanges::traits::FeedMessage;
use crate::hot_path::bridge::BridgePriceCache;
use crate::hot_path::ema::{EmaEngine, EmaUpdate};
use std::sync::Arc;

/// What a single message did to the engine state
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Bridge cache overwritten
    BridgeUpdated { symbol: String, price: f64 },
    /// First EMA observation for a target
    Seeded { symbol: String, ema: f64 },
    /// Decayed EMA update for a target
    Updated { symbol: String, ema: f64 },
    /// Target tick dropped because its bridge has no price yet
    Deferred { symbol: String },
    /// Symbol is neither a target nor a bridge
    Ignored { symbol: String },
    /// Control traffic (subscription ack, non-trade event)
    Acknowledged,
    /// Payload failed to decode
    Rejected(ParseError),
}

pub struct TickRouter {
    registry: Arc<PairRegistry>,
}

impl TickRouter {
    pub fn new(registry: Arc<PairRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PairRegistry {
        &self.registry
    }

    /// Apply one message. Bridge ticks never touch an EMA and target ticks
    /// never touch the bridge cache.
    pub fn dispatch(
        &self,
        msg: FeedMessage,
        bridge: &mut BridgePriceCache,
        ema: &mut EmaEngine,
    ) -> TickOutcome {
        let tick = match msg {
            FeedMessage::Trade(tick) => tick,
            FeedMessage::Control => return TickOutcome::Acknowledged,
            FeedMessage::Malformed(e) => return TickOutcome::Rejected(e),
        };

        if let Some(target) = self.registry.target(&tick.symbol) {
            return match ema.on_tick(target, &tick, bridge) {
                EmaUpdate::Seeded { ema } => TickOutcome::Seeded { symbol: tick.symbol, ema },
                EmaUpdate::Updated { ema, .. } => TickOutcome::Updated { symbol: tick.symbol, ema },
                EmaUpdate::Deferred => TickOutcome::Deferred { symbol: tick.symbol },
            };
        }

        if self.registry.is_bridge(&tick.symbol) {
            bridge.update(&tick.symbol, tick.price, tick.event_time);
            return TickOutcome::BridgeUpdated {
                symbol: tick.symbol,
                price: tick.price,
            };
        }

        TickOutcome::Ignored { symbol: tick.symbol }
    }
}
