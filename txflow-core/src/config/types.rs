use super::constants::*;
use super::profiles::Mode;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mode the pipeline starts in
    pub initial_mode: Mode,

    /// Start with the optimized processing path enabled
    pub optimized: bool,

    /// Intake queue capacity (oldest dropped on overflow)
    pub max_queue_size: usize,

    /// Completed ring capacity (oldest dropped on overflow)
    pub max_completed_size: usize,

    /// Arena slots
    pub pool_size: usize,

    /// Minimum interval between statistics recomputations (milliseconds)
    pub stats_interval_ms: u64,

    /// Starting reference price for synthetic prices
    pub base_price: f64,

    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,

    pub reporter: ReporterConfig,

    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::Normal,
            optimized: false,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_completed_size: DEFAULT_MAX_COMPLETED_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            stats_interval_ms: STATS_REFRESH_INTERVAL_MS,
            base_price: DEFAULT_BASE_PRICE,
            seed: None,
            reporter: ReporterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Downstream trade reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// "Send to backend" toggle
    pub enabled: bool,

    /// Price engine base URL, e.g. `http://127.0.0.1:8080`
    pub base_url: String,

    /// Simulation the trades are attributed to
    pub simulation_id: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Only the first N failures are logged
    pub max_logged_failures: u32,

    /// Minimum seconds between logged failures
    pub failure_log_cooldown_secs: u64,

    /// Submission throttle (0 disables throttling)
    pub max_reports_per_second: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:8080".to_string(),
            simulation_id: "default".to_string(),
            timeout_ms: DEFAULT_REPORT_TIMEOUT_MS,
            max_logged_failures: DEFAULT_MAX_LOGGED_FAILURES,
            failure_log_cooldown_secs: DEFAULT_FAILURE_LOG_COOLDOWN_SECS,
            max_reports_per_second: DEFAULT_MAX_REPORTS_PER_SECOND,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,

    /// Emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
