//! Bridge price cache
//!
//! Latest settlement price of each quote currency, keyed by bridge symbol
//! (e.g. `BTCUSDT`). Last write wins; entries are never removed.

use std::collections::HashMap;

/// Cached bridge observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeQuote {
    pub price: f64,
    /// Event time of the tick that set this price (ms)
    pub event_time: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BridgePriceCache {
    prices: HashMap<String, BridgeQuote>,
}

impl BridgePriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cached price for a bridge symbol
    pub fn update(&mut self, symbol: &str, price: f64, event_time: u64) {
        let quote = BridgeQuote { price, event_time };
        match self.prices.get_mut(symbol) {
            Some(slot) => *slot = quote,
            None => {
                self.prices.insert(symbol.to_string(), quote);
            }
        }
    }

    /// Latest price, `None` until the first bridge tick arrives
    #[inline]
    pub fn lookup(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).map(|quote| quote.price)
    }

    #[inline]
    pub fn get(&self, symbol: &str) -> Option<&BridgeQuote> {
        self.prices.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BridgeQuote)> {
        self.prices.iter().map(|(symbol, quote)| (symbol.as_str(), quote))
    }
}
