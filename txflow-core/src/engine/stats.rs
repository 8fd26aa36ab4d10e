//! Windowed processing statistics
//!
//! Counters that accumulate at completion time (`total_processed`, the
//! latency buckets) are updated on every completion. Everything derived
//! from the completed ring is recomputed at most once per refresh interval.

use super::processor::LatencyBucket;
use super::queue::CompletedRing;
use crate::config::constants::{RECENT_WINDOW, THROUGHPUT_WINDOW_MS};
use serde::{Deserialize, Serialize};

/// Point-in-time pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub total_processed: u64,
    /// Mean latency (ms) over the most recent completions
    pub average_processing_time: f64,
    pub throughput_per_second: u64,
    pub queue_size: usize,
    /// Percent failed over the most recent completions
    pub error_rate: f64,
    pub peak_throughput: u64,
    pub ultra_fast_trades: u64,
    pub fast_trades: u64,
    pub medium_trades: u64,
    pub slow_trades: u64,
    pub processing_count: usize,
    pub completed_count: usize,
    pub dropped_messages: u64,
    pub stale_completions: u64,
    pub pool_utilization: f64,
}

impl ProcessingStats {
    pub fn bucket_total(&self) -> u64 {
        self.ultra_fast_trades + self.fast_trades + self.medium_trades + self.slow_trades
    }
}

/// Gauges sampled from the pipeline at refresh time
#[derive(Debug, Clone, Copy, Default)]
pub struct Gauges {
    pub queue_size: usize,
    pub processing_count: usize,
    pub dropped_messages: u64,
    pub stale_completions: u64,
    pub pool_utilization: f64,
}

pub struct StatsAggregator {
    stats: ProcessingStats,
    interval_ms: i64,
    last_refresh_ms: Option<i64>,
}

impl StatsAggregator {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            stats: ProcessingStats::default(),
            interval_ms: interval_ms as i64,
            last_refresh_ms: None,
        }
    }

    /// Count one finished transaction
    #[inline]
    pub fn record_completion(&mut self, latency_ms: f64) {
        self.stats.total_processed += 1;
        match LatencyBucket::from_ms(latency_ms) {
            LatencyBucket::UltraFast => self.stats.ultra_fast_trades += 1,
            LatencyBucket::Fast => self.stats.fast_trades += 1,
            LatencyBucket::Medium => self.stats.medium_trades += 1,
            LatencyBucket::Slow => self.stats.slow_trades += 1,
        }
    }

    /// Recompute windowed figures if the refresh interval has elapsed
    ///
    /// Returns whether a refresh happened.
    pub fn maybe_refresh(
        &mut self,
        now_ms: i64,
        completed: &CompletedRing,
        gauges: Gauges,
    ) -> bool {
        let due = match self.last_refresh_ms {
            Some(last) => now_ms - last >= self.interval_ms,
            None => true,
        };
        if due {
            self.refresh(now_ms, completed, gauges);
        }
        due
    }

    /// Recompute windowed figures unconditionally
    pub fn refresh(&mut self, now_ms: i64, completed: &CompletedRing, gauges: Gauges) {
        let window_start = now_ms - THROUGHPUT_WINDOW_MS;
        let throughput = completed
            .iter()
            .rev()
            .filter(|tx| tx.timestamp_ms > window_start)
            .count() as u64;

        let mut sampled = 0usize;
        let mut latency_sum = 0.0;
        let mut failed = 0usize;
        for tx in completed.recent(RECENT_WINDOW) {
            sampled += 1;
            latency_sum += tx.processing_time_ms.unwrap_or(0.0);
            if tx.is_failed() {
                failed += 1;
            }
        }

        let stats = &mut self.stats;
        stats.throughput_per_second = throughput;
        stats.peak_throughput = stats.peak_throughput.max(throughput);
        if sampled > 0 {
            stats.average_processing_time = latency_sum / sampled as f64;
            stats.error_rate = failed as f64 / sampled as f64 * 100.0;
        } else {
            stats.average_processing_time = 0.0;
            stats.error_rate = 0.0;
        }

        stats.queue_size = gauges.queue_size;
        stats.processing_count = gauges.processing_count;
        stats.completed_count = completed.len();
        stats.dropped_messages = gauges.dropped_messages;
        stats.stale_completions = gauges.stale_completions;
        stats.pool_utilization = gauges.pool_utilization;

        self.last_refresh_ms = Some(now_ms);
    }

    pub fn snapshot(&self) -> ProcessingStats {
        self.stats.clone()
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.stats = ProcessingStats::default();
        self.last_refresh_ms = None;
    }
}
