//! Performance Utilities
//!
//! This module provides the allocation and accounting primitives of the
//! pipeline:
//! - **Generational arena**: pre-allocated transaction records, cyclic reuse
//! - **Lock-free metrics**: cache-padded atomic counters

pub mod arena;
pub mod metrics;

// Re-exports for convenience
pub use arena::{ArenaStats, TransactionArena, TxHandle};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
