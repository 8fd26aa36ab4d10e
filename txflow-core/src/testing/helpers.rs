//! Test helper utilities for creating test data
//!
//! Provides convenient builders for:
//! - Deterministic pipeline configurations
//! - Hand-built transactions
//! - Pipeline state with fresh metrics

use crate::config::{Mode, PipelineConfig};
use crate::core::{Action, Priority, TraderId, Transaction, TransactionKind};
use crate::engine::{PipelineState, PriceReference};
use crate::perf::PipelineMetrics;
use std::sync::Arc;

/// Default configuration with a fixed RNG seed
pub fn test_config(seed: u64) -> PipelineConfig {
    PipelineConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

/// Seeded configuration starting in `mode`
pub fn config_for_mode(mode: Mode, seed: u64) -> PipelineConfig {
    PipelineConfig {
        initial_mode: mode,
        ..test_config(seed)
    }
}

/// Pending transaction of `kind` at `priority`
pub fn make_transaction(kind: TransactionKind, priority: Priority) -> Transaction {
    Transaction {
        kind,
        priority,
        size: 1.0,
        trader: TraderId(1),
        price: Some(50_000.0),
        action: (kind == TransactionKind::Trade).then_some(Action::Buy),
        ..Default::default()
    }
}

/// Trade that has already finished successfully
pub fn completed_trade(action: Action, price: f64) -> Transaction {
    let mut tx = Transaction {
        action: Some(action),
        price: Some(price),
        ..make_transaction(TransactionKind::Trade, Priority::High)
    };
    // A fresh Pending record always accepts these transitions
    let _ = tx.begin_processing();
    let _ = tx.finish(crate::core::Outcome::Completed, 0.3);
    tx
}

/// Pipeline state with its own price reference and metrics
pub fn test_state(config: &PipelineConfig) -> PipelineState {
    PipelineState::new(
        config,
        PriceReference::new(config.base_price),
        Arc::new(PipelineMetrics::new()),
    )
}
