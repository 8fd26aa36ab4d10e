//! Priority admission
//!
//! Each scheduling pass admits up to `concurrency_limit - in_flight` pending
//! transactions from the intake queue, highest priority first. Within a
//! priority band arrival order wins, so the pass behaves like a stable sort
//! by descending priority followed by taking the head of the result.
//!
//! ```text
//! intake: [low#1, critical#2, medium#3, critical#4]   free = 2
//!   rank  ──▶ [critical#2, critical#4, medium#3, low#1]
//!   admit ──▶ [critical#2, critical#4]
//!   intake afterwards: [low#1, medium#3]   (arrival order kept)
//! ```
//!
//! Handles whose arena slot was reused by the generator are discarded
//! before ranking and counted in `metrics.stale_discarded`.

use super::queue::IntakeQueue;
use crate::core::Priority;
use crate::perf::{PipelineMetrics, TransactionArena, TxHandle};
use std::cmp::Reverse;
use tracing::debug;

/// Stable priority scheduler with reusable scratch space
#[derive(Debug, Default)]
pub struct Scheduler {
    /// (priority, queue position, handle) for every live queued handle
    ranked: Vec<(Priority, usize, TxHandle)>,
    /// Queue positions of admitted handles, ascending
    admitted: Vec<usize>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the handles to admit, highest priority first
    pub fn admit(
        &mut self,
        intake: &mut IntakeQueue,
        arena: &TransactionArena,
        in_flight: usize,
        concurrency_limit: usize,
        metrics: &PipelineMetrics,
    ) -> Vec<TxHandle> {
        let before = intake.len();
        intake.retain(|handle| arena.is_live(*handle));
        for _ in intake.len()..before {
            metrics.inc_stale_discarded();
        }
        if before != intake.len() {
            debug!(discarded = before - intake.len(), "discarded stale queue handles");
        }

        let free = concurrency_limit.saturating_sub(in_flight);
        if free == 0 || intake.is_empty() {
            return Vec::new();
        }

        self.ranked.clear();
        self.ranked.extend(intake.iter().enumerate().filter_map(|(pos, handle)| {
            arena.get(*handle).map(|tx| (tx.priority, pos, *handle))
        }));
        // sort_by_key is stable: ties keep arrival order
        self.ranked.sort_by_key(|(priority, _, _)| Reverse(*priority));
        self.ranked.truncate(free);

        let selected: Vec<TxHandle> = self.ranked.iter().map(|(_, _, h)| *h).collect();

        self.admitted.clear();
        self.admitted.extend(self.ranked.iter().map(|(_, pos, _)| *pos));
        self.admitted.sort_unstable();

        let admitted = &self.admitted;
        let mut position = 0usize;
        intake.retain(|_| {
            let keep = admitted.binary_search(&position).is_err();
            position += 1;
            keep
        });

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enqueue(
        arena: &mut TransactionArena,
        intake: &mut IntakeQueue,
        priority: Priority,
    ) -> TxHandle {
        let handle = arena.acquire();
        arena.get_mut(handle).unwrap().priority = priority;
        intake.push(handle);
        handle
    }

    #[test]
    fn test_highest_priority_admitted_first() {
        let mut arena = TransactionArena::new(16);
        let mut intake = IntakeQueue::new(16);
        let metrics = PipelineMetrics::new();
        let mut scheduler = Scheduler::new();

        let low = enqueue(&mut arena, &mut intake, Priority::Low);
        let critical = enqueue(&mut arena, &mut intake, Priority::Critical);
        let medium = enqueue(&mut arena, &mut intake, Priority::Medium);

        let admitted = scheduler.admit(&mut intake, &arena, 0, 1, &metrics);

        assert_eq!(admitted, vec![critical]);
        let remaining: Vec<_> = intake.iter().copied().collect();
        assert_eq!(remaining, vec![low, medium]);
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut arena = TransactionArena::new(16);
        let mut intake = IntakeQueue::new(16);
        let metrics = PipelineMetrics::new();
        let mut scheduler = Scheduler::new();

        let h1 = enqueue(&mut arena, &mut intake, Priority::High);
        let _m = enqueue(&mut arena, &mut intake, Priority::Medium);
        let h2 = enqueue(&mut arena, &mut intake, Priority::High);
        let h3 = enqueue(&mut arena, &mut intake, Priority::High);

        let admitted = scheduler.admit(&mut intake, &arena, 0, 2, &metrics);
        assert_eq!(admitted, vec![h1, h2]);

        let admitted = scheduler.admit(&mut intake, &arena, 0, 1, &metrics);
        assert_eq!(admitted, vec![h3]);
    }

    #[test]
    fn test_respects_in_flight() {
        let mut arena = TransactionArena::new(16);
        let mut intake = IntakeQueue::new(16);
        let metrics = PipelineMetrics::new();
        let mut scheduler = Scheduler::new();

        for _ in 0..5 {
            enqueue(&mut arena, &mut intake, Priority::Medium);
        }

        assert!(scheduler.admit(&mut intake, &arena, 10, 10, &metrics).is_empty());
        assert!(scheduler.admit(&mut intake, &arena, 12, 10, &metrics).is_empty());
        assert_eq!(scheduler.admit(&mut intake, &arena, 7, 10, &metrics).len(), 3);
        assert_eq!(intake.len(), 2);
    }

    #[test]
    fn test_stale_handles_discarded() {
        let mut arena = TransactionArena::new(2);
        let mut intake = IntakeQueue::new(16);
        let metrics = PipelineMetrics::new();
        let mut scheduler = Scheduler::new();

        let stale = enqueue(&mut arena, &mut intake, Priority::Critical);
        let _b = enqueue(&mut arena, &mut intake, Priority::Low);
        // Wraps onto `stale`'s slot
        let fresh = enqueue(&mut arena, &mut intake, Priority::Medium);

        let admitted = scheduler.admit(&mut intake, &arena, 0, 1, &metrics);

        assert_eq!(admitted, vec![fresh]);
        assert!(!intake.iter().any(|h| *h == stale));
        assert_eq!(metrics.snapshot().stale_discarded, 1);
    }
}
