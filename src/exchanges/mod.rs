//! Exchange-specific implementations

pub mod binance;
pub mod parsing;
pub mod traits;

pub use binance::BinanceWsClient;
pub use parsing::{BinanceMessage, BinanceParser, ParseError};
pub use traits::{FeedMessage, TradeFeed};
