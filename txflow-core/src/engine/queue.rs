//! Bounded pipeline buffers
//!
//! Both buffers apply backpressure by dropping from the head (oldest) when
//! full; producers are never blocked.
//!
//! - `IntakeQueue`: arena handles of `Pending` transactions, arrival order
//! - `CompletedRing`: owned copies of finished transactions; the arena slot
//!   is already released when a record lands here

use crate::core::Transaction;
use crate::perf::TxHandle;
use std::collections::VecDeque;

/// Bounded FIFO of pending transaction handles
#[derive(Debug)]
pub struct IntakeQueue {
    entries: VecDeque<TxHandle>,
    capacity: usize,
}

impl IntakeQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a handle, evicting and returning the oldest entry when full
    #[inline]
    pub fn push(&mut self, handle: TxHandle) -> Option<TxHandle> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(handle);
        evicted
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handles in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &TxHandle> + '_ {
        self.entries.iter()
    }

    /// Keep only the handles for which `keep` returns true, preserving order
    pub fn retain<F: FnMut(&TxHandle) -> bool>(&mut self, keep: F) {
        self.entries.retain(keep);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Bounded ring of finished transactions
#[derive(Debug)]
pub struct CompletedRing {
    entries: VecDeque<Transaction>,
    capacity: usize,
}

impl CompletedRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting and returning the oldest when full
    #[inline]
    pub fn push(&mut self, record: Transaction) -> Option<Transaction> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(record);
        evicted
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records in completion order (oldest first)
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Transaction> + '_ {
        self.entries.iter()
    }

    /// The `n` most recently completed records, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Transaction> + '_ {
        self.entries.iter().rev().take(n)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
