//! Lock-Free Pipeline Counters
//!
//! Cache-padded atomic counters shared between the pipeline state, the
//! runtime driver and the downstream reporter. All counters use relaxed
//! ordering; they are monitoring data, not synchronization.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-padded counters
///
/// Each counter sits on its own cache line so reporter tasks and the tick
/// loop never false-share.
#[derive(Default)]
pub struct PipelineMetrics {
    /// Transactions synthesized by the generator
    pub generated: CachePadded<AtomicU64>,

    /// New transactions refused because the intake queue was full
    pub refused: CachePadded<AtomicU64>,

    /// Oldest pending transactions evicted from the intake queue
    pub evicted_intake: CachePadded<AtomicU64>,

    /// Oldest finished transactions evicted from the completed ring
    pub evicted_completed: CachePadded<AtomicU64>,

    /// Queued handles discarded because their arena slot was reused
    pub stale_discarded: CachePadded<AtomicU64>,

    /// Completion timers that fired for a transaction no longer in flight
    pub stale_completions: CachePadded<AtomicU64>,

    /// Completion timers aborted by pause/reset
    pub cancelled_timers: CachePadded<AtomicU64>,

    /// Completions taken through the immediate hft path
    pub fast_path_completions: CachePadded<AtomicU64>,

    /// Trades accepted by the downstream endpoint
    pub reports_sent: CachePadded<AtomicU64>,

    /// Trades the downstream endpoint rejected or never received
    pub reports_failed: CachePadded<AtomicU64>,

    /// Trades skipped by the submission throttle
    pub reports_throttled: CachePadded<AtomicU64>,
}

#[inline(always)]
fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_generated(&self) {
        bump(&self.generated);
    }

    #[inline(always)]
    pub fn inc_refused(&self) {
        bump(&self.refused);
    }

    #[inline(always)]
    pub fn add_evicted_intake(&self, n: u64) {
        self.evicted_intake.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn add_evicted_completed(&self, n: u64) {
        self.evicted_completed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_stale_discarded(&self) {
        bump(&self.stale_discarded);
    }

    #[inline(always)]
    pub fn inc_stale_completions(&self) {
        bump(&self.stale_completions);
    }

    #[inline(always)]
    pub fn add_cancelled_timers(&self, n: u64) {
        self.cancelled_timers.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_fast_path(&self) {
        bump(&self.fast_path_completions);
    }

    #[inline(always)]
    pub fn inc_reports_sent(&self) {
        bump(&self.reports_sent);
    }

    #[inline(always)]
    pub fn inc_reports_failed(&self) {
        bump(&self.reports_failed);
    }

    #[inline(always)]
    pub fn inc_reports_throttled(&self) {
        bump(&self.reports_throttled);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            evicted_intake: self.evicted_intake.load(Ordering::Relaxed),
            evicted_completed: self.evicted_completed.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            stale_completions: self.stale_completions.load(Ordering::Relaxed),
            cancelled_timers: self.cancelled_timers.load(Ordering::Relaxed),
            fast_path_completions: self.fast_path_completions.load(Ordering::Relaxed),
            reports_sent: self.reports_sent.load(Ordering::Relaxed),
            reports_failed: self.reports_failed.load(Ordering::Relaxed),
            reports_throttled: self.reports_throttled.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in [
            &self.generated,
            &self.refused,
            &self.evicted_intake,
            &self.evicted_completed,
            &self.stale_discarded,
            &self.stale_completions,
            &self.cancelled_timers,
            &self.fast_path_completions,
            &self.reports_sent,
            &self.reports_failed,
            &self.reports_throttled,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot of counters at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub generated: u64,
    pub refused: u64,
    pub evicted_intake: u64,
    pub evicted_completed: u64,
    pub stale_discarded: u64,
    pub stale_completions: u64,
    pub cancelled_timers: u64,
    pub fast_path_completions: u64,
    pub reports_sent: u64,
    pub reports_failed: u64,
    pub reports_throttled: u64,
}

impl MetricsSnapshot {
    /// Everything the pipeline dropped on the floor for lack of room
    pub fn dropped_messages(&self) -> u64 {
        self.refused + self.evicted_intake + self.evicted_completed + self.stale_discarded
    }

    /// Fraction of attempted submissions the downstream accepted
    pub fn report_success_rate(&self) -> f64 {
        let attempted = self.reports_sent + self.reports_failed;
        if attempted > 0 {
            self.reports_sent as f64 / attempted as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_cache_padded() {
        let metrics = PipelineMetrics::new();
        let generated_ptr = &metrics.generated as *const _ as usize;
        let refused_ptr = &metrics.refused as *const _ as usize;

        assert!(refused_ptr - generated_ptr >= 64);
    }

    #[test]
    fn test_metrics_operations() {
        let metrics = PipelineMetrics::new();

        metrics.inc_generated();
        metrics.inc_generated();
        metrics.inc_refused();
        metrics.add_evicted_completed(3);
        metrics.inc_reports_sent();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.generated, 2);
        assert_eq!(snapshot.refused, 1);
        assert_eq!(snapshot.evicted_completed, 3);
        assert_eq!(snapshot.dropped_messages(), 4);
        assert_eq!(snapshot.reports_sent, 1);
    }

    #[test]
    fn test_report_success_rate() {
        let snapshot = MetricsSnapshot {
            reports_sent: 3,
            reports_failed: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.report_success_rate(), 0.75);
        assert_eq!(MetricsSnapshot::default().report_success_rate(), 0.0);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = PipelineMetrics::new();

        metrics.inc_generated();
        metrics.inc_reports_failed();
        metrics.reset();

        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
