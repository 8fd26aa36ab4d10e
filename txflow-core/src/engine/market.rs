//! Simulated market state
//!
//! - `PriceReference`: shared base price, read by the generator and written
//!   by the downstream reporter when the price engine answers with a new
//!   price. Stored as f64 bits in an atomic so neither side needs a lock.
//! - `MarketTrend`: mean-reverting random walk biasing sizes, prices and
//!   the buy/sell mix.

use crate::config::constants::MAX_MARKET_TREND;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared base price (lock-free, cheap to clone)
#[derive(Debug, Clone)]
pub struct PriceReference {
    bits: Arc<AtomicU64>,
}

impl PriceReference {
    pub fn new(price: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(price.to_bits())),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Update the reference price
    ///
    /// Non-finite or non-positive prices are ignored; returns whether the
    /// price was applied.
    pub fn set(&self, price: f64) -> bool {
        if !price.is_finite() || price <= 0.0 {
            return false;
        }
        self.bits.store(price.to_bits(), Ordering::Release);
        true
    }
}

/// Mean-reverting market trend in `[-MAX_MARKET_TREND, MAX_MARKET_TREND]`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketTrend {
    value: f64,
}

/// Per-step pull back toward zero
const TREND_DECAY: f64 = 0.98;

/// Largest random step per tick
const TREND_STEP: f64 = 0.02;

impl MarketTrend {
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(-MAX_MARKET_TREND, MAX_MARKET_TREND),
        }
    }

    /// Advance one step of the random walk
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        let step = rng.gen_range(-TREND_STEP..=TREND_STEP);
        self.value = (self.value * TREND_DECAY + step).clamp(-MAX_MARKET_TREND, MAX_MARKET_TREND);
    }

    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Size multiplier: calmer markets trade smaller
    #[inline(always)]
    pub fn volatility(&self) -> f64 {
        1.0 + self.value.abs()
    }
}
