//! Synthetic transaction generator
//!
//! Each tick synthesizes `ceil(target_rate * elapsed_ms / 1000)` transactions
//! straight into arena slots and pushes their handles onto the intake queue.
//!
//! ## Distributions
//!
//! ```text
//! kind:      60% trade | 20% order_place | 15% order_cancel | 5% liquidation
//! priority:  trade        -> 20% critical, 20% high, 60% medium
//!            order_place  -> medium
//!            order_cancel -> high
//!            liquidation  -> critical
//! ```
//!
//! Trade direction uses a self-balancing buy probability so a long run never
//! drifts into one-sided flow.

use super::market::{MarketTrend, PriceReference};
use super::queue::IntakeQueue;
use crate::config::constants::*;
use crate::config::ModeProfile;
use crate::core::{Action, Priority, TraderId, Transaction, TransactionId, TransactionKind};
use crate::perf::{PipelineMetrics, TransactionArena};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Instant;
use tracing::trace;

/// Running buy/sell counters with periodic halving
#[derive(Debug, Clone, Copy, Default)]
pub struct BuySellBalance {
    buys: u64,
    sells: u64,
}

impl BuySellBalance {
    /// Probability that the next trade is a buy
    ///
    /// Base 0.5, corrected by 0.1 against whichever side exceeds 55% of the
    /// running mix, nudged by the market trend, clamped to [0.2, 0.8].
    pub fn buy_probability(&self, trend: f64) -> f64 {
        let mut probability = 0.5;

        if let Some(ratio) = self.buy_ratio() {
            if ratio > BALANCE_SKEW_THRESHOLD {
                probability -= BALANCE_CORRECTION;
            } else if ratio < 1.0 - BALANCE_SKEW_THRESHOLD {
                probability += BALANCE_CORRECTION;
            }
        }

        (probability + trend * 0.1).clamp(MIN_BUY_PROBABILITY, MAX_BUY_PROBABILITY)
    }

    /// Count a trade, halving both counters once their sum passes the threshold
    pub fn record(&mut self, action: Action) {
        match action {
            Action::Buy => self.buys += 1,
            Action::Sell => self.sells += 1,
        }

        if self.buys + self.sells > BALANCE_HALVING_THRESHOLD {
            self.buys /= 2;
            self.sells /= 2;
        }
    }

    pub fn buy_ratio(&self) -> Option<f64> {
        let total = self.buys + self.sells;
        (total > 0).then(|| self.buys as f64 / total as f64)
    }

    pub fn buys(&self) -> u64 {
        self.buys
    }

    pub fn sells(&self) -> u64 {
        self.sells
    }
}

/// Transaction synthesizer
pub struct Generator {
    rng: StdRng,
    balance: BuySellBalance,
    trend: MarketTrend,
    price: PriceReference,
    started: Instant,
    counter: u32,
}

impl Generator {
    pub fn new(rng: StdRng, price: PriceReference) -> Self {
        Self {
            rng,
            balance: BuySellBalance::default(),
            trend: MarketTrend::default(),
            price,
            started: Instant::now(),
            counter: 0,
        }
    }

    /// Synthesize transactions for `elapsed_ms` of wall time
    ///
    /// Returns the number enqueued. When the intake queue is full the new
    /// transaction is refused (counted in `metrics.refused`) and no arena
    /// slot is consumed.
    pub fn tick(
        &mut self,
        elapsed_ms: u64,
        now_ms: i64,
        profile: &ModeProfile,
        arena: &mut TransactionArena,
        intake: &mut IntakeQueue,
        metrics: &PipelineMetrics,
    ) -> usize {
        let wanted = profile.transactions_for(elapsed_ms);
        self.trend.advance(&mut self.rng);

        let mut enqueued = 0;
        for _ in 0..wanted {
            if intake.is_full() {
                metrics.inc_refused();
                continue;
            }

            let handle = arena.acquire();
            if let Some(slot) = arena.get_mut(handle) {
                *slot = self.synthesize(now_ms);
            }
            intake.push(handle);
            metrics.inc_generated();
            enqueued += 1;
        }

        trace!(wanted, enqueued, queue = intake.len(), "generation tick");
        enqueued
    }

    /// Build one pending transaction
    pub fn synthesize(&mut self, now_ms: i64) -> Transaction {
        let kind = self.pick_kind();
        let priority = self.pick_priority(kind);
        let action = (kind == TransactionKind::Trade).then(|| self.pick_action());

        Transaction {
            id: self.next_id(),
            timestamp_ms: now_ms,
            kind,
            priority,
            size: self.pick_size(kind, priority),
            trader: TraderId(self.rng.gen_range(0..SYNTHETIC_TRADERS)),
            action,
            price: Some(self.pick_price(kind)),
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> TransactionId {
        let nanos = self.started.elapsed().as_nanos() as u64;
        let suffix = self.rng.gen::<u32>();
        self.counter = self.counter.wrapping_add(1);
        TransactionId::compose(nanos, suffix, self.counter)
    }

    fn pick_kind(&mut self) -> TransactionKind {
        let roll: f64 = self.rng.gen();
        if roll < 0.60 {
            TransactionKind::Trade
        } else if roll < 0.80 {
            TransactionKind::OrderPlace
        } else if roll < 0.95 {
            TransactionKind::OrderCancel
        } else {
            TransactionKind::Liquidation
        }
    }

    fn pick_priority(&mut self, kind: TransactionKind) -> Priority {
        match kind {
            TransactionKind::Trade => {
                let roll: f64 = self.rng.gen();
                if roll < 0.20 {
                    Priority::Critical
                } else if roll < 0.40 {
                    Priority::High
                } else {
                    Priority::Medium
                }
            }
            TransactionKind::OrderPlace => Priority::Medium,
            TransactionKind::OrderCancel => Priority::High,
            TransactionKind::Liquidation => Priority::Critical,
        }
    }

    fn pick_action(&mut self) -> Action {
        let p_buy = self.balance.buy_probability(self.trend.value());
        let action = if self.rng.gen_bool(p_buy) {
            Action::Buy
        } else {
            Action::Sell
        };
        self.balance.record(action);
        action
    }

    fn pick_size(&mut self, kind: TransactionKind, priority: Priority) -> f64 {
        let (low, high) = match (kind, priority) {
            (TransactionKind::Liquidation, _) | (TransactionKind::Trade, Priority::Critical) => {
                (1.0, 10.0)
            }
            (TransactionKind::Trade, _) => (0.01, 2.0),
            _ => (0.1, 5.0),
        };
        let size = self.rng.gen_range(low..high) * self.trend.volatility();
        round_to(size, 4)
    }

    fn pick_price(&mut self, kind: TransactionKind) -> f64 {
        let base = self.price.get();
        let offset = match kind {
            // Trades track the market closely
            TransactionKind::Trade => {
                self.rng.gen_range(-0.0005..=0.0005) + self.trend.value() * 0.001
            }
            // Liquidations execute at a worse price
            TransactionKind::Liquidation => -self.rng.gen_range(0.005..=0.02),
            TransactionKind::OrderPlace | TransactionKind::OrderCancel => {
                self.rng.gen_range(-0.01..=0.01)
            }
        };
        round_to(base * (1.0 + offset), 2)
    }

    pub fn balance(&self) -> &BuySellBalance {
        &self.balance
    }

    pub fn trend(&self) -> MarketTrend {
        self.trend
    }

    pub fn price_reference(&self) -> &PriceReference {
        &self.price
    }

    /// Forget the buy/sell mix and market trend
    pub fn reset(&mut self) {
        self.balance = BuySellBalance::default();
        self.trend = MarketTrend::default();
    }
}

#[inline]
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
