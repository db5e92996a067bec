//! Time-decayed EMA per target pair
//!
//! The smoothing factor depends on the wall-clock gap between a pair's ticks,
//! not on tick count:
//!
//! ```text
//! alpha = exp(-(t - t_last) / TAU)
//! ema   = alpha * ema + (1 - alpha) * price * bridge
//! ```
//!
//! A pair starts `Uninitialized`; its first convertible tick seeds the EMA
//! with the converted price (no decay). Ticks that arrive with a timestamp
//! older than the last update use a zero gap, so they never amplify the old
//! value.

use crate::core::{PriceTick, TargetPair};
use crate::hot_path::bridge::BridgePriceCache;
use std::collections::HashMap;
use std::time::Duration;

/// Default decay constant
pub const DEFAULT_TAU: Duration = Duration::from_secs(10);

/// EMA state of a tracked pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEmaState {
    /// Settlement-denominated EMA
    pub ema: f64,
    /// Event time of the latest applied tick (ms)
    pub last_update: u64,
    /// Number of ticks folded in, seed included
    pub updates: u64,
}

/// Per-pair lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairStatus {
    Uninitialized,
    Tracking(PairEmaState),
}

/// Result of applying one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmaUpdate {
    /// First observation, EMA set to the converted price
    Seeded { ema: f64 },
    /// Decayed update
    Updated { ema: f64, alpha: f64 },
    /// Bridge price not known yet, or the conversion overflowed; nothing changed
    Deferred,
}

/// Decay factor for a gap of `elapsed_ms` with time constant `tau_secs`
#[inline]
pub fn decay_factor(elapsed_ms: u64, tau_secs: f64) -> f64 {
    if elapsed_ms == 0 {
        return 1.0;
    }
    if tau_secs <= 0.0 {
        return 0.0;
    }
    let elapsed_secs = Duration::from_millis(elapsed_ms).as_secs_f64();
    (-elapsed_secs / tau_secs).exp()
}

/// Owner of all per-pair EMA states
#[derive(Debug, Clone)]
pub struct EmaEngine {
    tau_secs: f64,
    states: HashMap<String, PairEmaState>,
}

impl EmaEngine {
    pub fn new(tau: Duration) -> Self {
        Self {
            tau_secs: tau.as_secs_f64(),
            states: HashMap::new(),
        }
    }

    /// Fold a target-pair tick into its EMA
    pub fn on_tick(
        &mut self,
        target: &TargetPair,
        tick: &PriceTick,
        bridge: &BridgePriceCache,
    ) -> EmaUpdate {
        let Some(price) = settlement_price(target, tick.price, bridge) else {
            return EmaUpdate::Deferred;
        };

        match self.states.get_mut(&target.symbol) {
            None => {
                self.states.insert(
                    target.symbol.clone(),
                    PairEmaState {
                        ema: price,
                        last_update: tick.event_time,
                        updates: 1,
                    },
                );
                EmaUpdate::Seeded { ema: price }
            }
            Some(state) => {
                let elapsed = tick.event_time.saturating_sub(state.last_update);
                let alpha = decay_factor(elapsed, self.tau_secs);
                state.ema = alpha * state.ema + (1.0 - alpha) * price;
                state.last_update = state.last_update.max(tick.event_time);
                state.updates += 1;
                EmaUpdate::Updated {
                    ema: state.ema,
                    alpha,
                }
            }
        }
    }

    pub fn state(&self, symbol: &str) -> PairStatus {
        match self.states.get(symbol) {
            Some(state) => PairStatus::Tracking(*state),
            None => PairStatus::Uninitialized,
        }
    }

    #[inline]
    pub fn get(&self, symbol: &str) -> Option<&PairEmaState> {
        self.states.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PairEmaState)> {
        self.states.iter().map(|(symbol, state)| (symbol.as_str(), state))
    }

    pub fn tracked_count(&self) -> usize {
        self.states.len()
    }
}

impl Default for EmaEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TAU)
    }
}

/// Convert a quote-denominated price into settlement units.
///
/// Settlement-quoted pairs pass through; others need a cached bridge price.
/// A product that is not finite counts as unavailable.
#[inline]
pub fn settlement_price(target: &TargetPair, price: f64, bridge: &BridgePriceCache) -> Option<f64> {
    let converted = match &target.bridge_symbol {
        None => price,
        Some(symbol) => price * bridge.lookup(symbol)?,
    };
    converted.is_finite().then_some(converted)
}
