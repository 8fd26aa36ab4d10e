//! Domain-specific error types for the transaction pipeline
//!
//! Pipeline-internal conditions (overflow, simulated failures, downstream
//! outages) never surface as errors; they are counted in statistics. These
//! types cover the cases that do reach a caller.

use super::types::TransactionStatus;
use thiserror::Error;

/// Illegal transaction status transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("illegal status transition: {from} -> {to}")]
    Illegal {
        from: TransactionStatus,
        to: TransactionStatus,
    },
}

/// Invalid pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("pool_size {pool_size} must be at least {minimum} (10x the busiest concurrency limit)")]
    PoolTooSmall { pool_size: usize, minimum: usize },

    #[error("pool_size {pool_size} must exceed queue + max in-flight ({live_capacity})")]
    PoolBelowLiveCapacity { pool_size: usize, live_capacity: usize },

    #[error("unknown mode '{0}', must be one of: normal, burst, stress, hft")]
    UnknownMode(String),

    #[error("reporter.base_url '{0}' must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("reporter.simulation_id must not be empty")]
    MissingSimulationId,

    #[error("invalid log level '{0}', must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Failure submitting a trade downstream
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("downstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("downstream unavailable: {0}")]
    Unavailable(String),
}

/// Control command sent after the pipeline task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pipeline is no longer running")]
pub struct PipelineClosed;
