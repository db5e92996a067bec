//! Trading pair identities
//!
//! A pair is an immutable (base, quote) couple of asset codes. Everything else
//! (bridge pair, settlement pair, wire symbols) is derived on demand.

use crate::core::registry::RegistryError;
use std::fmt;

/// Normalized (base, quote) currency pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    /// Create a pair from two asset codes.
    ///
    /// Codes are upper-cased. Fails if either code is empty or both are equal.
    pub fn new(base: &str, quote: &str) -> Result<Self, RegistryError> {
        let base = normalize_asset(base)?;
        let quote = normalize_asset(quote)?;
        if base == quote {
            return Err(RegistryError::SameAsset(base));
        }
        Ok(Self { base, quote })
    }

    #[inline]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[inline]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Quote currency against the settlement currency (the bridge pair).
    ///
    /// Returns `None` when the quote already is the settlement currency.
    pub fn quote_settlement_pair(&self, settlement: &str) -> Option<TradingPair> {
        Self::new(&self.quote, settlement).ok()
    }

    /// Base currency against the settlement currency.
    pub fn base_settlement_pair(&self, settlement: &str) -> Option<TradingPair> {
        Self::new(&self.base, settlement).ok()
    }

    /// Exchange symbol, e.g. `SOLBTC`
    pub fn symbol_upper(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Stream symbol, e.g. `solbtc`
    pub fn symbol_lower(&self) -> String {
        self.symbol_upper().to_lowercase()
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

pub(crate) fn normalize_asset(code: &str) -> Result<String, RegistryError> {
    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RegistryError::InvalidAsset(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols() {
        let pair = TradingPair::new("sol", "btc").unwrap();
        assert_eq!(pair.symbol_upper(), "SOLBTC");
        assert_eq!(pair.symbol_lower(), "solbtc");
        assert_eq!(pair.to_string(), "SOL/BTC");
    }

    #[test]
    fn test_derived_pairs() {
        let pair = TradingPair::new("SOL", "BTC").unwrap();
        let bridge = pair.quote_settlement_pair("USDT").unwrap();
        assert_eq!(bridge.symbol_upper(), "BTCUSDT");
        let base = pair.base_settlement_pair("USDT").unwrap();
        assert_eq!(base.symbol_upper(), "SOLUSDT");
    }

    #[test]
    fn test_settlement_quoted_has_no_bridge() {
        let pair = TradingPair::new("SOL", "USDT").unwrap();
        assert!(pair.quote_settlement_pair("USDT").is_none());
    }

    #[test]
    fn test_rejects_same_asset() {
        assert!(matches!(
            TradingPair::new("SOL", "sol"),
            Err(RegistryError::SameAsset(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_asset() {
        assert!(TradingPair::new("", "BTC").is_err());
        assert!(TradingPair::new("SOL", "B/TC").is_err());
    }
}
