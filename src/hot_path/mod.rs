//! Streaming core - no I/O, no awaits
//!
//! - Tick routing
//! - Bridge price cache
//! - Time-decayed EMA per pair
//! - Volume-weighted composite

pub mod aggregator;
pub mod bridge;
pub mod ema;
pub mod routing;

pub use aggregator::{
    composite_from, AggregateError, CompositePrice, PairContribution, VolumeWeights,
    WeightedAggregator,
};
pub use bridge::{BridgePriceCache, BridgeQuote};
pub use ema::{decay_factor, EmaEngine, EmaUpdate, PairEmaState, PairStatus, DEFAULT_TAU};
pub use routing::{TickOutcome, TickRouter};
