//! Centralized constants for the transaction pipeline
//!
//! Defaults for `PipelineConfig` and the fixed parameters of the simulation
//! model. Runtime-tunable values are mirrored in `PipelineConfig`; the rest
//! are compile-time constants.

// ===== CAPACITY =====

/// Maximum pending transactions in the intake queue
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

/// Maximum finished transactions retained in the completed ring
pub const DEFAULT_MAX_COMPLETED_SIZE: usize = 5_000;

/// Arena slots. Must exceed intake capacity plus the busiest concurrency
/// limit so a live record is never overwritten under default settings.
pub const DEFAULT_POOL_SIZE: usize = 16_384;

/// Minimum arena size as a multiple of the busiest concurrency limit
pub const POOL_SIZE_MULTIPLIER: usize = 10;

// ===== STATISTICS =====

/// Minimum wall time between statistics recomputations (10x/sec max)
pub const STATS_REFRESH_INTERVAL_MS: u64 = 100;

/// Sliding window for throughput
pub const THROUGHPUT_WINDOW_MS: i64 = 1_000;

/// Number of most recent completions used for average latency and error rate
pub const RECENT_WINDOW: usize = 100;

/// Latency bucket upper bounds (ms): ultra-fast < 1, fast < 5, medium <= 15
pub const ULTRA_FAST_BELOW_MS: f64 = 1.0;
pub const FAST_BELOW_MS: f64 = 5.0;
pub const MEDIUM_UP_TO_MS: f64 = 15.0;

// ===== PROCESSING =====

/// Failure probability on the general (timer) path
pub const GENERAL_FAILURE_PROBABILITY: f64 = 0.01;

/// Failure probability on the hft + critical immediate path
pub const FAST_PATH_FAILURE_PROBABILITY: f64 = 0.001;

// ===== GENERATION =====

/// Starting reference price for synthetic prices
pub const DEFAULT_BASE_PRICE: f64 = 50_000.0;

/// Buy/sell counters are halved once their sum exceeds this
pub const BALANCE_HALVING_THRESHOLD: u64 = 1_000;

/// Running buy ratio beyond which the buy probability is corrected
pub const BALANCE_SKEW_THRESHOLD: f64 = 0.55;

/// Correction applied to the buy probability when skewed
pub const BALANCE_CORRECTION: f64 = 0.1;

/// Bounds on the buy probability
pub const MIN_BUY_PROBABILITY: f64 = 0.2;
pub const MAX_BUY_PROBABILITY: f64 = 0.8;

/// Market trend is clamped to +/- this value
pub const MAX_MARKET_TREND: f64 = 0.5;

/// Number of distinct synthetic traders
pub const SYNTHETIC_TRADERS: u16 = 100;

// ===== DOWNSTREAM REPORTING =====

/// Only the first N downstream failures are ever logged
pub const DEFAULT_MAX_LOGGED_FAILURES: u32 = 5;

/// Minimum time between two logged downstream failures
pub const DEFAULT_FAILURE_LOG_COOLDOWN_SECS: u64 = 30;

/// Submission throttle (token bucket refill per second and burst)
pub const DEFAULT_MAX_REPORTS_PER_SECOND: u64 = 200;

/// HTTP request timeout for trade submissions
pub const DEFAULT_REPORT_TIMEOUT_MS: u64 = 2_000;
