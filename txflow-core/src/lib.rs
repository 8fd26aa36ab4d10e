//! txflow Core - Bounded, Priority-Aware Transaction Pipeline
//!
//! txflow ingests synthetic trading events at a configurable rate, schedules
//! them for simulated execution, tracks latency/throughput statistics and
//! forwards completed trades to a downstream price engine. It exists to
//! stress-test consumers at tens of thousands of events per second.
//!
//! ## Architecture
//! - **Generational arena**: pre-allocated records, cyclic reuse, stale
//!   handles detected by generation tag
//! - **Bounded buffers**: intake queue and completed ring drop oldest
//! - **Stable priority admission** up to a per-mode concurrency limit
//! - **Lock-free counters** shared between the tick loop and reporter tasks
//! - **Fire-and-forget reporting** that never blocks or fails the pipeline
//!
//! ## Data Flow
//! ```text
//! Generator → IntakeQueue → Scheduler → Processor → CompletedRing
//!                                                      ├─▶ StatsAggregator
//!                                                      └─▶ DownstreamReporter
//! ```
//!
//! ## Core Modules
//! - `core`: Transaction types and errors
//! - `config`: Modes, profiles and layered configuration
//! - `perf`: Arena and metrics
//! - `engine`: Generator, scheduler, processor, stats, runtime
//! - `reporter`: Downstream trade submission

pub mod config;
pub mod core;
pub mod engine;
pub mod perf;
pub mod reporter;
pub mod testing;
pub mod utils;

pub use crate::core::{
    Action, Outcome, Priority, Transaction, TransactionId, TransactionKind, TransactionStatus,
};
pub use config::{Mode, ModeProfile, PipelineConfig};
pub use engine::{Pipeline, PipelineHandle, PipelineState, ProcessingStats};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    // Core types
    pub use crate::core::{
        Action, Outcome, Priority, Transaction, TransactionKind, TransactionStatus,
    };

    // Configuration
    pub use crate::config::{Mode, ModeProfile, PipelineConfig};

    // Engine
    pub use crate::engine::{Pipeline, PipelineHandle, PipelineState, ProcessingStats};

    // Reporting
    pub use crate::reporter::{HttpTradeSink, TradeSink};

    // Error types
    pub use crate::{Error, Result};
}
