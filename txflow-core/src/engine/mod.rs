//! Transaction pipeline engine
//!
//! - `generator`: synthetic transactions into the intake queue
//! - `queue`: bounded intake queue and completed ring
//! - `scheduler`: stable priority admission
//! - `processor`: latency table, jitter and outcome roll
//! - `stats`: windowed statistics
//! - `pipeline`: synchronous state tying the above together
//! - `runtime`: tokio driver and control handle

pub mod generator;
pub mod market;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod runtime;
pub mod scheduler;
pub mod stats;

pub use generator::{BuySellBalance, Generator};
pub use market::{MarketTrend, PriceReference};
pub use pipeline::{is_reportable, InFlight, PipelineState, TickReport};
pub use processor::{base_latency_ms, Dispatch, LatencyBucket, Plan, Processor};
pub use queue::{CompletedRing, IntakeQueue};
pub use runtime::{Command, Pipeline, PipelineHandle};
pub use scheduler::Scheduler;
pub use stats::{Gauges, ProcessingStats, StatsAggregator};
