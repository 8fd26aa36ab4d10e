//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use txflow_core::config::Mode;
use txflow_core::engine::ProcessingStats;
use txflow_core::perf::MetricsSnapshot;
use txflow_core::utils::init_logger;
use txflow_core::PipelineConfig;

/// Common CLI arguments for all binaries
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// TOML configuration file (defaults and TXFLOW__ env vars apply on top)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Load mode: normal, burst, stress, hft
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Enable the optimized (hft critical fast path) processing
    #[arg(long)]
    pub optimized: bool,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

impl CommonArgs {
    /// Load the configuration file (if any) and apply CLI overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.initial_mode = mode;
        }
        if self.optimized {
            config.optimized = true;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(level) = &self.log_level {
            config.logging.log_level = level.clone();
        }
        if self.json_logs {
            config.logging.json_logs = true;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Initialize tracing/logging from the resolved configuration
pub fn init_logging(config: &PipelineConfig) -> Result<()> {
    init_logger(&config.logging)
}

/// Print final statistics
pub fn print_stats(stats: &ProcessingStats, metrics: &MetricsSnapshot) {
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Transactions processed: {}", stats.total_processed);
    tracing::info!("Average processing time: {:.3}ms", stats.average_processing_time);
    tracing::info!(
        "Throughput: {}/s (peak {}/s)",
        stats.throughput_per_second,
        stats.peak_throughput
    );
    tracing::info!("Error rate: {:.2}%", stats.error_rate);
    tracing::info!(
        "Latency buckets: <1ms {} | 1-5ms {} | 5-15ms {} | >15ms {}",
        stats.ultra_fast_trades,
        stats.fast_trades,
        stats.medium_trades,
        stats.slow_trades
    );
    tracing::info!(
        "Queue: {} pending, {} processing, {} dropped",
        stats.queue_size,
        stats.processing_count,
        stats.dropped_messages
    );

    let attempted = metrics.reports_sent + metrics.reports_failed;
    if attempted > 0 {
        tracing::info!(
            "Reports: {} sent, {} failed, {} throttled ({:.1}% success)",
            metrics.reports_sent,
            metrics.reports_failed,
            metrics.reports_throttled,
            metrics.report_success_rate() * 100.0
        );
    }
}
