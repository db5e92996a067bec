//! Pair registry for one base asset
//!
//! Built once at startup from the discovered target pairs. Holds the target
//! symbol table and the set of bridge symbols needed to convert every target
//! quote into the settlement currency. Read-only afterwards.

use crate::core::pair::normalize_asset;
use crate::core::TradingPair;
use std::collections::{BTreeSet, HashMap};

/// A target pair with its precomputed wire symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPair {
    pub pair: TradingPair,
    /// Upper-case exchange symbol, e.g. `SOLBTC`
    pub symbol: String,
    /// Bridge symbol, e.g. `BTCUSDT`; `None` for settlement-quoted pairs
    pub bridge_symbol: Option<String>,
}

impl TargetPair {
    fn new(pair: TradingPair, settlement: &str) -> Self {
        let bridge_symbol = pair
            .quote_settlement_pair(settlement)
            .map(|bridge| bridge.symbol_upper());
        Self {
            symbol: pair.symbol_upper(),
            pair,
            bridge_symbol,
        }
    }

    /// True if the price needs no bridge conversion
    #[inline]
    pub fn is_direct(&self) -> bool {
        self.bridge_symbol.is_none()
    }
}

/// Registry of target and bridge symbols
#[derive(Debug, Clone)]
pub struct PairRegistry {
    base: String,
    settlement: String,
    targets: Vec<TargetPair>,
    lookup_table: HashMap<String, usize>,
    bridges: BTreeSet<String>,
}

impl PairRegistry {
    /// Build a registry from discovered pairs.
    ///
    /// All pairs must share the same base asset.
    pub fn new(settlement: &str, pairs: Vec<TradingPair>) -> Result<Self, RegistryError> {
        let settlement = normalize_asset(settlement)?;

        let base = match pairs.first() {
            Some(pair) => pair.base().to_string(),
            None => return Err(RegistryError::NoPairs),
        };

        let mut registry = Self {
            base,
            settlement,
            targets: Vec::with_capacity(pairs.len()),
            lookup_table: HashMap::with_capacity(pairs.len()),
            bridges: BTreeSet::new(),
        };

        for pair in pairs {
            if pair.base() != registry.base {
                return Err(RegistryError::BaseMismatch {
                    expected: registry.base.clone(),
                    found: pair.to_string(),
                });
            }

            let target = TargetPair::new(pair, &registry.settlement);
            if registry.lookup_table.contains_key(&target.symbol) {
                return Err(RegistryError::Duplicate(target.symbol));
            }
            if let Some(bridge) = &target.bridge_symbol {
                registry.bridges.insert(bridge.clone());
            }
            registry
                .lookup_table
                .insert(target.symbol.clone(), registry.targets.len());
            registry.targets.push(target);
        }

        if let Some(symbol) = registry
            .bridges
            .iter()
            .find(|bridge| registry.lookup_table.contains_key(bridge.as_str()))
        {
            return Err(RegistryError::Ambiguous(symbol.clone()));
        }

        tracing::info!(
            "Pair registry initialized for {}: {} targets, {} bridges",
            registry.base,
            registry.targets.len(),
            registry.bridges.len()
        );
        Ok(registry)
    }

    /// Build a registry from a base asset and its quote currencies
    pub fn for_base<'a, I>(base: &str, settlement: &str, quotes: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let pairs = quotes
            .into_iter()
            .map(|quote| TradingPair::new(base, quote))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(settlement, pairs)
    }

    #[inline]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[inline]
    pub fn settlement(&self) -> &str {
        &self.settlement
    }

    /// Look up a target pair by its upper-case symbol
    #[inline]
    pub fn target(&self, symbol: &str) -> Option<&TargetPair> {
        self.lookup_table.get(symbol).map(|&idx| &self.targets[idx])
    }

    #[inline]
    pub fn is_bridge(&self, symbol: &str) -> bool {
        self.bridges.contains(symbol)
    }

    /// Target pairs in registration order
    pub fn targets(&self) -> &[TargetPair] {
        &self.targets
    }

    /// Bridge symbols in sorted order
    pub fn bridge_symbols(&self) -> impl Iterator<Item = &str> {
        self.bridges.iter().map(String::as_str)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid asset code: {0:?}")]
    InvalidAsset(String),
    #[error("Base and quote are the same asset: {0}")]
    SameAsset(String),
    #[error("Pair {found} does not share base asset {expected}")]
    BaseMismatch { expected: String, found: String },
    #[error("Duplicate target symbol: {0}")]
    Duplicate(String),
    #[error("Symbol is both a target and a bridge: {0}")]
    Ambiguous(String),
    #[error("No target pairs")]
    NoPairs,
}
