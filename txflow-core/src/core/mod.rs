//! Core transaction types
//!
//! This module provides the fundamental building blocks of the pipeline:
//! - `TransactionId`: u128-based identifiers (zero heap allocation)
//! - `Transaction`: `Copy` record stored in arena slots
//! - `TransactionStatus`: monotonic lifecycle with checked transitions
//! - Error types for the few conditions that reach callers

pub mod errors;
pub mod types;

// Re-export commonly used types
pub use errors::{ConfigError, PipelineClosed, ReportError, TransitionError};
pub use types::{
    Action, Outcome, Priority, TraderId, Transaction, TransactionId, TransactionKind,
    TransactionStatus,
};
