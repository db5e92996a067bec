//! Volume-weighted composite of per-pair EMAs
//!
//! `composite = Σ wᵢ·emaᵢ / Σ wᵢ` over pairs that are both tracking and
//! weighted. A weighted pair without an EMA yet is left out of both sums.

use crate::hot_path::ema::EmaEngine;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("No data: no weighted pair has an EMA yet")]
    NoData,
    #[error("Invalid weight for {symbol}: {weight}")]
    InvalidWeight { symbol: String, weight: f64 },
}

/// Settlement-denominated 24h volume per target symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeWeights {
    weights: HashMap<String, f64>,
}

impl VolumeWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight of a target symbol. Must be finite and non-negative.
    pub fn insert(&mut self, symbol: impl Into<String>, weight: f64) -> Result<(), AggregateError> {
        let symbol = symbol.into();
        if !weight.is_finite() || weight < 0.0 {
            return Err(AggregateError::InvalidWeight { symbol, weight });
        }
        self.weights.insert(symbol, weight);
        Ok(())
    }

    #[inline]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(symbol, weight)| (symbol.as_str(), *weight))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

impl TryFrom<HashMap<String, f64>> for VolumeWeights {
    type Error = AggregateError;

    fn try_from(map: HashMap<String, f64>) -> Result<Self, Self::Error> {
        let mut weights = Self::new();
        for (symbol, weight) in map {
            weights.insert(symbol, weight)?;
        }
        Ok(weights)
    }
}

/// One pair's part of the composite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairContribution {
    pub symbol: String,
    pub ema: f64,
    pub weight: f64,
    /// weight / total weight
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositePrice {
    pub value: f64,
    pub pair_count: usize,
    pub total_weight: f64,
    /// Sorted by symbol
    pub pairs: Vec<PairContribution>,
}

pub struct WeightedAggregator;

impl WeightedAggregator {
    /// Composite over the engine's tracking pairs
    pub fn composite(ema: &EmaEngine, weights: &VolumeWeights) -> Result<CompositePrice, AggregateError> {
        composite_from(ema.iter().filter_map(|(symbol, state)| {
            weights
                .get(symbol)
                .map(|weight| (symbol, state.ema, weight))
        }))
    }
}

/// Composite from `(symbol, ema, weight)` triples
///
/// Terms with a non-finite EMA or weight are skipped. A sum that still
/// overflows yields `NoData` rather than a non-finite value.
pub fn composite_from<'a, I>(entries: I) -> Result<CompositePrice, AggregateError>
where
    I: IntoIterator<Item = (&'a str, f64, f64)>,
{
    let mut pairs = Vec::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (symbol, ema, weight) in entries {
        if !ema.is_finite() || !weight.is_finite() {
            continue;
        }
        weighted_sum += weight * ema;
        total_weight += weight;
        pairs.push(PairContribution {
            symbol: symbol.to_string(),
            ema,
            weight,
            share: 0.0,
        });
    }

    if pairs.is_empty() || total_weight <= 0.0 {
        return Err(AggregateError::NoData);
    }
    let value = weighted_sum / total_weight;
    if !value.is_finite() {
        return Err(AggregateError::NoData);
    }

    for pair in &mut pairs {
        pair.share = pair.weight / total_weight;
    }
    pairs.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    Ok(CompositePrice {
        value,
        pair_count: pairs.len(),
        total_weight,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hot_path::bridge::BridgePriceCache;
    use crate::test_utils::{sol_registry, trade_tick};
    use proptest::prelude::*;

    #[test]
    fn test_weighted_mean() {
        let composite = composite_from([("A", 10.0, 2.0), ("B", 20.0, 3.0)]).unwrap();
        assert_eq!(composite.value, 16.0);
        assert_eq!(composite.pair_count, 2);
        assert_eq!(composite.total_weight, 5.0);
        assert_eq!(composite.pairs[0].symbol, "A");
        assert!((composite.pairs[0].share - 0.4).abs() < 1e-12);
        assert!((composite.pairs[1].share - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_no_pairs_is_no_data() {
        assert_eq!(composite_from([]), Err(AggregateError::NoData));
        let engine = EmaEngine::default();
        assert_eq!(
            WeightedAggregator::composite(&engine, &VolumeWeights::new()),
            Err(AggregateError::NoData)
        );
    }

    #[test]
    fn test_zero_total_weight_is_no_data() {
        assert_eq!(composite_from([("A", 10.0, 0.0)]), Err(AggregateError::NoData));
    }

    #[test]
    fn test_non_finite_terms_never_reach_the_value() {
        // 0 * inf must not turn the composite into NaN
        let composite = composite_from([("A", f64::INFINITY, 0.0), ("B", 100.0, 1.0)]).unwrap();
        assert_eq!(composite.value, 100.0);
        assert_eq!(composite.pair_count, 1);
        assert_eq!(composite.pairs[0].symbol, "B");

        assert_eq!(composite_from([("A", f64::NAN, 1.0)]), Err(AggregateError::NoData));

        // Finite terms whose weighted sum overflows
        assert_eq!(
            composite_from([("A", f64::MAX, 1e10), ("B", f64::MAX, 1e10)]),
            Err(AggregateError::NoData)
        );
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut weights = VolumeWeights::new();
        assert!(weights.insert("SOLBTC", f64::NAN).is_err());
        assert!(weights.insert("SOLBTC", -1.0).is_err());
        assert!(weights.insert("SOLBTC", 0.0).is_ok());
        assert_eq!(weights.len(), 1);
    }

    #[test]
    fn test_uninitialized_pairs_excluded() {
        let registry = sol_registry();
        let mut engine = EmaEngine::default();
        let bridge = BridgePriceCache::new();
        engine.on_tick(
            registry.target("SOLUSDT").unwrap(),
            &trade_tick("SOLUSDT", 100.0, 1),
            &bridge,
        );

        let mut weights = VolumeWeights::new();
        weights.insert("SOLUSDT", 1_000.0).unwrap();
        // Weighted but never ticked; must not drag the result towards zero
        weights.insert("SOLBTC", 5_000.0).unwrap();

        let composite = WeightedAggregator::composite(&engine, &weights).unwrap();
        assert_eq!(composite.value, 100.0);
        assert_eq!(composite.pair_count, 1);
        assert_eq!(composite.total_weight, 1_000.0);
    }

    #[test]
    fn test_tracking_pair_without_weight_excluded() {
        let registry = sol_registry();
        let mut engine = EmaEngine::default();
        let bridge = BridgePriceCache::new();
        engine.on_tick(
            registry.target("SOLUSDT").unwrap(),
            &trade_tick("SOLUSDT", 100.0, 1),
            &bridge,
        );

        assert_eq!(
            WeightedAggregator::composite(&engine, &VolumeWeights::new()),
            Err(AggregateError::NoData)
        );
    }

    #[test]
    fn test_weights_from_map() {
        let map = HashMap::from([("SOLBTC".to_string(), 2.0), ("SOLETH".to_string(), 3.0)]);
        let weights = VolumeWeights::try_from(map).unwrap();
        assert_eq!(weights.total(), 5.0);

        let bad = HashMap::from([("SOLBTC".to_string(), f64::INFINITY)]);
        assert!(VolumeWeights::try_from(bad).is_err());
    }

    proptest! {
        #[test]
        fn prop_composite_within_ema_range(
            entries in proptest::collection::vec((1.0f64..1_000.0, 0.001f64..1e9), 1..16),
        ) {
            let symbols: Vec<String> = (0..entries.len()).map(|i| format!("P{}", i)).collect();
            let composite = composite_from(
                symbols.iter().zip(&entries).map(|(s, (ema, w))| (s.as_str(), *ema, *w)),
            ).unwrap();

            let lo = entries.iter().map(|(ema, _)| *ema).fold(f64::INFINITY, f64::min);
            let hi = entries.iter().map(|(ema, _)| *ema).fold(f64::NEG_INFINITY, f64::max);
            let tol = hi * 1e-9;
            prop_assert!(composite.value >= lo - tol && composite.value <= hi + tol);

            let share: f64 = composite.pairs.iter().map(|p| p.share).sum();
            prop_assert!((share - 1.0).abs() < 1e-9);
        }
    }
}
