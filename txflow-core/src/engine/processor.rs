//! Simulated execution
//!
//! Base latency (ms) by kind and priority:
//!
//! ```text
//!                critical  high  medium  low
//! order_cancel     0.05    0.2    0.5    1.5
//! trade            0.10    0.3    0.8    2.1
//! order_place      0.15    0.5    1.2    3.0
//! liquidation      0.20    0.8    2.0    4.2
//! ```
//!
//! The planned delay is `base * (1 + u)` with `u` uniform in
//! `[-jitter, +jitter]`. Outcomes fail with probability 1%, or 0.1% on the
//! fast path (hft mode, critical priority, optimized processing), where the
//! completion is applied inline instead of through a timer.

use crate::config::constants::{
    FAST_BELOW_MS, FAST_PATH_FAILURE_PROBABILITY, GENERAL_FAILURE_PROBABILITY, MEDIUM_UP_TO_MS,
    ULTRA_FAST_BELOW_MS,
};
use crate::config::ModeProfile;
use crate::core::{Outcome, Priority, Transaction, TransactionKind};
use crate::perf::TxHandle;
use rand::rngs::StdRng;
use rand::Rng;

/// Base simulated latency in milliseconds
pub const fn base_latency_ms(kind: TransactionKind, priority: Priority) -> f64 {
    use Priority::*;
    use TransactionKind::*;

    match (kind, priority) {
        (OrderCancel, Critical) => 0.05,
        (OrderCancel, High) => 0.2,
        (OrderCancel, Medium) => 0.5,
        (OrderCancel, Low) => 1.5,
        (Trade, Critical) => 0.1,
        (Trade, High) => 0.3,
        (Trade, Medium) => 0.8,
        (Trade, Low) => 2.1,
        (OrderPlace, Critical) => 0.15,
        (OrderPlace, High) => 0.5,
        (OrderPlace, Medium) => 1.2,
        (OrderPlace, Low) => 3.0,
        (Liquidation, Critical) => 0.2,
        (Liquidation, High) => 0.8,
        (Liquidation, Medium) => 2.0,
        (Liquidation, Low) => 4.2,
    }
}

/// Latency classification for the stats buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBucket {
    /// < 1ms
    UltraFast,
    /// 1-5ms
    Fast,
    /// 5-15ms
    Medium,
    /// > 15ms
    Slow,
}

impl LatencyBucket {
    pub fn from_ms(latency_ms: f64) -> Self {
        if latency_ms < ULTRA_FAST_BELOW_MS {
            Self::UltraFast
        } else if latency_ms < FAST_BELOW_MS {
            Self::Fast
        } else if latency_ms <= MEDIUM_UP_TO_MS {
            Self::Medium
        } else {
            Self::Slow
        }
    }
}

/// A scheduled completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    pub handle: TxHandle,
    pub delay_ms: f64,
    pub outcome: Outcome,
}

/// Execution plan for one admitted transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    pub delay_ms: f64,
    pub outcome: Outcome,
    /// Complete inline, no timer
    pub immediate: bool,
}

/// Latency and outcome roller
pub struct Processor {
    rng: StdRng,
}

impl Processor {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Roll delay and outcome for `tx`
    pub fn plan(&mut self, tx: &Transaction, profile: &ModeProfile, fast_path: bool) -> Plan {
        let base = base_latency_ms(tx.kind, tx.priority);
        let jitter = profile.jitter;
        let u = if jitter > 0.0 {
            self.rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };

        let failure_probability = if fast_path {
            FAST_PATH_FAILURE_PROBABILITY
        } else {
            GENERAL_FAILURE_PROBABILITY
        };
        let outcome = if self.rng.gen_bool(failure_probability) {
            Outcome::Failed
        } else {
            Outcome::Completed
        };

        Plan {
            delay_ms: base * (1.0 + u),
            outcome,
            immediate: fast_path,
        }
    }
}
