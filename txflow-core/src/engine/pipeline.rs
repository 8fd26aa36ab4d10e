//! Synchronous pipeline state
//!
//! `PipelineState` owns every container of the pipeline and implements the
//! generation, scheduling and completion steps as plain method calls. The
//! async runtime wraps it in a mutex and drives it from the tick loop and
//! the completion timers; tests and benchmarks drive it directly.
//!
//! ```text
//!  tick(elapsed, now)
//!    ├─ Generator ──▶ IntakeQueue            (refuse when full)
//!    ├─ Scheduler ──▶ processing set         (admit up to the limit)
//!    │     └─ fast path ──▶ complete inline
//!    └─ StatsAggregator::maybe_refresh
//!
//!  complete(handle)                          (timer fired)
//!    processing set ──▶ arena.release ──▶ CompletedRing + stats
//! ```

use super::generator::Generator;
use super::market::PriceReference;
use super::processor::{Dispatch, Processor};
use super::queue::{CompletedRing, IntakeQueue};
use super::scheduler::Scheduler;
use super::stats::{Gauges, ProcessingStats, StatsAggregator};
use crate::config::{Mode, ModeProfile, PipelineConfig};
use crate::core::{Outcome, Priority, Transaction, TransactionStatus};
use crate::perf::{ArenaStats, PipelineMetrics, TransactionArena, TxHandle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A transaction waiting for its completion timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InFlight {
    pub delay_ms: f64,
    pub outcome: Outcome,
}

/// Result of one tick
#[derive(Debug, Default)]
pub struct TickReport {
    /// Transactions synthesized into the intake queue
    pub generated: usize,
    /// Admissions that need a completion timer
    pub dispatched: Vec<Dispatch>,
    /// Finished trades (fast path) to hand to the reporter
    pub reportable: Vec<Transaction>,
}

/// Whether a finished record goes downstream
#[inline]
pub fn is_reportable(tx: &Transaction) -> bool {
    tx.is_trade() && tx.status == TransactionStatus::Completed
}

pub struct PipelineState {
    arena: TransactionArena,
    intake: IntakeQueue,
    processing: HashMap<TxHandle, InFlight>,
    completed: CompletedRing,
    generator: Generator,
    scheduler: Scheduler,
    processor: Processor,
    stats: StatsAggregator,
    metrics: Arc<PipelineMetrics>,
    mode: Mode,
    profile: ModeProfile,
    optimized: bool,
}

impl PipelineState {
    /// Build the state from a validated configuration
    pub fn new(
        config: &PipelineConfig,
        price: PriceReference,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let (generator_rng, processor_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        info!(
            mode = %config.initial_mode,
            optimized = config.optimized,
            pool_size = config.pool_size,
            max_queue_size = config.max_queue_size,
            max_completed_size = config.max_completed_size,
            "pipeline state initialized"
        );

        Self {
            arena: TransactionArena::new(config.pool_size),
            intake: IntakeQueue::new(config.max_queue_size),
            processing: HashMap::with_capacity(Mode::busiest_concurrency_limit()),
            completed: CompletedRing::new(config.max_completed_size),
            generator: Generator::new(generator_rng, price),
            scheduler: Scheduler::new(),
            processor: Processor::new(processor_rng),
            stats: StatsAggregator::new(config.stats_interval_ms),
            metrics,
            mode: config.initial_mode,
            profile: config.initial_mode.profile(),
            optimized: config.optimized,
        }
    }

    /// One generation + scheduling step
    pub fn tick(&mut self, elapsed_ms: u64, now_ms: i64) -> TickReport {
        let generated = self.generate(elapsed_ms, now_ms);
        let (dispatched, reportable) = self.schedule();
        self.maybe_refresh_stats(now_ms);

        TickReport {
            generated,
            dispatched,
            reportable,
        }
    }

    /// Synthesize transactions for `elapsed_ms` into the intake queue
    pub fn generate(&mut self, elapsed_ms: u64, now_ms: i64) -> usize {
        self.generator.tick(
            elapsed_ms,
            now_ms,
            &self.profile,
            &mut self.arena,
            &mut self.intake,
            &self.metrics,
        )
    }

    /// Inject an externally built transaction
    ///
    /// The record is reset to `Pending`. If the intake queue is full the
    /// oldest queued transaction is evicted and its slot released.
    pub fn enqueue(&mut self, tx: Transaction) -> TxHandle {
        let handle = self.arena.acquire();
        if let Some(slot) = self.arena.get_mut(handle) {
            *slot = Transaction {
                status: TransactionStatus::Pending,
                processing_time_ms: None,
                ..tx
            };
        }

        if let Some(evicted) = self.intake.push(handle) {
            self.arena.release(evicted);
            self.metrics.add_evicted_intake(1);
            warn!(%evicted, "intake queue full, dropped oldest transaction");
        }
        handle
    }

    /// Admit queued transactions up to the concurrency limit
    ///
    /// Returns the dispatches that need a completion timer and the trades
    /// finished inline on the fast path.
    pub fn schedule(&mut self) -> (Vec<Dispatch>, Vec<Transaction>) {
        let admitted = self.scheduler.admit(
            &mut self.intake,
            &self.arena,
            self.processing.len(),
            self.profile.concurrency_limit,
            &self.metrics,
        );

        let mut dispatched = Vec::with_capacity(admitted.len());
        let mut reportable = Vec::new();

        for handle in admitted {
            let priority = match self.arena.get_mut(handle) {
                Some(tx) => match tx.begin_processing() {
                    Ok(()) => tx.priority,
                    Err(e) => {
                        warn!(%handle, error = %e, "admitted transaction not pending");
                        continue;
                    }
                },
                None => continue,
            };

            let fast_path = self.fast_path_applies(priority);
            let Some(tx) = self.arena.get(handle) else {
                continue;
            };
            let plan = self.processor.plan(tx, &self.profile, fast_path);

            if plan.immediate {
                self.metrics.inc_fast_path();
                if let Some(done) = self.finish(handle, plan.delay_ms, plan.outcome) {
                    if is_reportable(&done) {
                        reportable.push(done);
                    }
                }
            } else {
                self.processing.insert(
                    handle,
                    InFlight {
                        delay_ms: plan.delay_ms,
                        outcome: plan.outcome,
                    },
                );
                dispatched.push(Dispatch {
                    handle,
                    delay_ms: plan.delay_ms,
                    outcome: plan.outcome,
                });
            }
        }

        if !dispatched.is_empty() || !reportable.is_empty() {
            debug!(
                dispatched = dispatched.len(),
                fast_path = reportable.len(),
                in_flight = self.processing.len(),
                queue = self.intake.len(),
                "scheduling pass"
            );
        }

        (dispatched, reportable)
    }

    #[inline]
    fn fast_path_applies(&self, priority: Priority) -> bool {
        self.optimized && self.mode == Mode::Hft && priority == Priority::Critical
    }

    /// Completion timer fired for `handle`
    ///
    /// Returns the finished record, or `None` if the handle is no longer in
    /// flight or its slot was reused (counted as a stale completion).
    pub fn complete(&mut self, handle: TxHandle) -> Option<Transaction> {
        let Some(flight) = self.processing.remove(&handle) else {
            self.metrics.inc_stale_completions();
            return None;
        };
        self.finish(handle, flight.delay_ms, flight.outcome)
    }

    /// Move a processing record to its terminal status and into the ring
    fn finish(
        &mut self,
        handle: TxHandle,
        latency_ms: f64,
        outcome: Outcome,
    ) -> Option<Transaction> {
        let Some(mut record) = self.arena.release(handle) else {
            self.metrics.inc_stale_completions();
            return None;
        };

        if let Err(e) = record.finish(outcome, latency_ms) {
            warn!(%handle, error = %e, "discarding completion");
            self.metrics.inc_stale_completions();
            return None;
        }

        self.stats.record_completion(latency_ms);
        if self.completed.push(record).is_some() {
            self.metrics.add_evicted_completed(1);
        }
        Some(record)
    }

    fn gauges(&self) -> Gauges {
        let metrics = self.metrics.snapshot();
        Gauges {
            queue_size: self.intake.len(),
            processing_count: self.processing.len(),
            dropped_messages: metrics.dropped_messages(),
            stale_completions: metrics.stale_completions,
            pool_utilization: self.arena.stats().utilization,
        }
    }

    /// Recompute windowed stats if the refresh interval elapsed
    pub fn maybe_refresh_stats(&mut self, now_ms: i64) -> bool {
        let gauges = self.gauges();
        self.stats.maybe_refresh(now_ms, &self.completed, gauges)
    }

    /// Recompute windowed stats now and return them
    pub fn refresh_stats(&mut self, now_ms: i64) -> ProcessingStats {
        let gauges = self.gauges();
        self.stats.refresh(now_ms, &self.completed, gauges);
        self.stats.snapshot()
    }

    pub fn stats(&self) -> ProcessingStats {
        self.stats.snapshot()
    }

    /// Switch load mode; takes effect on the next tick
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "mode changed");
        }
        self.mode = mode;
        self.profile = mode.profile();
    }

    /// Toggle optimized processing; statistics restart from zero
    pub fn set_optimized(&mut self, optimized: bool) {
        if optimized != self.optimized {
            info!(optimized, "optimized processing toggled, resetting statistics");
            self.stats.reset();
            self.metrics.reset();
        }
        self.optimized = optimized;
    }

    /// Drop every transaction and zero all statistics
    pub fn reset(&mut self) {
        self.arena.clear();
        self.intake.clear();
        self.processing.clear();
        self.completed.clear();
        self.generator.reset();
        self.stats.reset();
        self.metrics.reset();
        info!("pipeline reset");
    }

    /// Transactions currently waiting for a completion timer
    pub fn in_flight(&self) -> Vec<Dispatch> {
        self.processing
            .iter()
            .map(|(handle, flight)| Dispatch {
                handle: *handle,
                delay_ms: flight.delay_ms,
                outcome: flight.outcome,
            })
            .collect()
    }

    pub fn get(&self, handle: TxHandle) -> Option<&Transaction> {
        self.arena.get(handle)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn profile(&self) -> &ModeProfile {
        &self.profile
    }

    pub fn optimized(&self) -> bool {
        self.optimized
    }

    pub fn queue_len(&self) -> usize {
        self.intake.len()
    }

    pub fn processing_len(&self) -> usize {
        self.processing.len()
    }

    pub fn completed(&self) -> &CompletedRing {
        &self.completed
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransactionKind;

    fn state(mode: Mode, optimized: bool) -> PipelineState {
        let config = PipelineConfig {
            initial_mode: mode,
            optimized,
            seed: Some(17),
            ..Default::default()
        };
        PipelineState::new(
            &config,
            PriceReference::new(50_000.0),
            Arc::new(PipelineMetrics::new()),
        )
    }

    fn tx(kind: TransactionKind, priority: Priority) -> Transaction {
        Transaction {
            kind,
            priority,
            size: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_generates_and_admits() {
        let mut state = state(Mode::Normal, false);

        let report = state.tick(1_000, 0);

        assert_eq!(report.generated, 10);
        assert_eq!(report.dispatched.len(), 10);
        assert_eq!(state.processing_len(), 10);
        assert_eq!(state.queue_len(), 0);

        // Limit reached: next tick only queues
        let report = state.tick(1_000, 1_000);
        assert_eq!(report.generated, 10);
        assert!(report.dispatched.is_empty());
        assert_eq!(state.queue_len(), 10);
    }

    #[test]
    fn test_complete_moves_record_to_ring() {
        let mut state = state(Mode::Normal, false);
        let handle = state.enqueue(tx(TransactionKind::Trade, Priority::High));

        let (dispatched, _) = state.schedule();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(state.get(handle).unwrap().status, TransactionStatus::Processing);

        let done = state.complete(handle).unwrap();
        assert!(done.status.is_terminal());
        assert_eq!(done.processing_time_ms, Some(dispatched[0].delay_ms));
        assert_eq!(state.completed().len(), 1);
        assert_eq!(state.processing_len(), 0);
        assert!(state.get(handle).is_none());
        assert_eq!(state.stats().total_processed, 1);
    }

    #[test]
    fn test_double_completion_is_stale() {
        let mut state = state(Mode::Normal, false);
        let handle = state.enqueue(tx(TransactionKind::Trade, Priority::Low));
        state.schedule();

        assert!(state.complete(handle).is_some());
        assert!(state.complete(handle).is_none());
        assert_eq!(state.metrics().snapshot().stale_completions, 1);
        assert_eq!(state.stats().total_processed, 1);
    }

    #[test]
    fn test_fast_path_completes_inline() {
        let mut state = state(Mode::Hft, true);
        let critical = state.enqueue(tx(TransactionKind::Trade, Priority::Critical));
        let medium = state.enqueue(tx(TransactionKind::Trade, Priority::Medium));

        let (dispatched, _reportable) = state.schedule();

        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].handle, medium);
        assert!(state.get(critical).is_none());
        assert_eq!(state.completed().len(), 1);
        assert_eq!(state.metrics().snapshot().fast_path_completions, 1);
        assert_eq!(state.stats().total_processed, 1);
    }

    #[test]
    fn test_fast_path_requires_optimized() {
        let mut state = state(Mode::Hft, false);
        state.enqueue(tx(TransactionKind::Trade, Priority::Critical));

        let (dispatched, reportable) = state.schedule();
        assert_eq!(dispatched.len(), 1);
        assert!(reportable.is_empty());
    }

    #[test]
    fn test_enqueue_evicts_oldest_when_full() {
        let config = PipelineConfig {
            max_queue_size: 2,
            seed: Some(1),
            ..Default::default()
        };
        let mut state = PipelineState::new(
            &config,
            PriceReference::new(100.0),
            Arc::new(PipelineMetrics::new()),
        );

        let first = state.enqueue(tx(TransactionKind::Trade, Priority::Critical));
        state.enqueue(tx(TransactionKind::Trade, Priority::Low));
        state.enqueue(tx(TransactionKind::Trade, Priority::Low));

        assert_eq!(state.queue_len(), 2);
        assert!(state.get(first).is_none());
        assert_eq!(state.metrics().snapshot().evicted_intake, 1);
        assert_eq!(state.arena_stats().live, 2);
    }

    #[test]
    fn test_completed_ring_overflow_counted() {
        let config = PipelineConfig {
            max_completed_size: 3,
            seed: Some(2),
            ..Default::default()
        };
        let mut state = PipelineState::new(
            &config,
            PriceReference::new(100.0),
            Arc::new(PipelineMetrics::new()),
        );

        let handles: Vec<_> = (0..5)
            .map(|_| state.enqueue(tx(TransactionKind::OrderPlace, Priority::Medium)))
            .collect();
        state.schedule();
        for handle in handles {
            state.complete(handle);
        }

        assert_eq!(state.completed().len(), 3);
        assert_eq!(state.metrics().snapshot().evicted_completed, 2);
        assert_eq!(state.stats().total_processed, 5);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = state(Mode::Burst, false);
        state.tick(1_000, 0);
        let in_flight = state.in_flight();
        assert!(!in_flight.is_empty());

        state.reset();

        assert_eq!(state.queue_len(), 0);
        assert_eq!(state.processing_len(), 0);
        assert!(state.completed().is_empty());
        assert_eq!(state.arena_stats().live, 0);
        assert_eq!(state.stats(), ProcessingStats::default());
        for dispatch in in_flight {
            assert!(state.complete(dispatch.handle).is_none());
        }
    }

    #[test]
    fn test_set_optimized_resets_stats() {
        let mut state = state(Mode::Normal, false);
        let handle = state.enqueue(tx(TransactionKind::Trade, Priority::High));
        state.schedule();
        state.complete(handle);
        assert_eq!(state.stats().total_processed, 1);

        state.set_optimized(true);
        assert_eq!(state.stats().total_processed, 0);
        assert!(state.optimized());
    }

    #[test]
    fn test_only_completed_trades_reportable() {
        let mut record = tx(TransactionKind::Trade, Priority::High);
        record.begin_processing().unwrap();
        record.finish(Outcome::Completed, 0.3).unwrap();
        assert!(is_reportable(&record));

        let mut failed = tx(TransactionKind::Trade, Priority::High);
        failed.begin_processing().unwrap();
        failed.finish(Outcome::Failed, 0.3).unwrap();
        assert!(!is_reportable(&failed));

        let mut order = tx(TransactionKind::OrderPlace, Priority::High);
        order.begin_processing().unwrap();
        order.finish(Outcome::Completed, 0.3).unwrap();
        assert!(!is_reportable(&order));
    }
}
