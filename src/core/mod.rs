//! Core types
//!
//! - TradingPair: base/quote asset pair
//! - PairRegistry: target pairs of one base asset and their bridges
//! - PriceTick: validated trade observation
//! - PairDiscovery: startup pair and volume lookup

pub mod discovery;
pub mod market_data;
pub mod pair;
pub mod registry;

pub use discovery::{DiscoveryError, PairDiscovery};
pub use market_data::PriceTick;
pub use pair::TradingPair;
pub use registry::{PairRegistry, RegistryError, TargetPair};
