//! Generational Transaction Arena
//!
//! Pre-allocated ring of transaction records handed out cyclically, so the
//! hot path never touches the heap. Every handle carries the generation of
//! its slot; reusing a slot bumps the generation, turning any handle still
//! pointing at the old occupant into a stale handle that reads as `None`.
//!
//! ```text
//! acquire() ──▶ slot[cursor % capacity], generation += 1, fields reset
//!
//!   handle(3, g=7) ── slot 3 reused ──▶ slot 3 now g=8 ──▶ handle(3, g=7) is stale
//! ```
//!
//! # Example
//! ```
//! use txflow_core::perf::arena::TransactionArena;
//!
//! let mut arena = TransactionArena::new(4);
//! let handle = arena.acquire();
//! arena.get_mut(handle).unwrap().size = 1.5;
//! let record = arena.release(handle).unwrap();
//! assert_eq!(record.size, 1.5);
//! assert!(arena.get(handle).is_none());
//! ```

use crate::core::Transaction;
use std::fmt;

/// Generation-tagged reference to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle {
    index: u32,
    generation: u32,
}

impl TxHandle {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline(always)]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    live: bool,
    record: Transaction,
}

/// Fixed-capacity, cyclically reused block of transaction records
pub struct TransactionArena {
    slots: Box<[Slot]>,
    cursor: u64,
    live: usize,
    overwrites: u64,
}

impl TransactionArena {
    /// Create an arena with `capacity` pre-allocated records
    ///
    /// This should be done once at startup, not in the hot path.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "arena capacity must be positive");
        assert!(capacity <= u32::MAX as usize, "arena capacity exceeds u32 index space");

        Self {
            slots: vec![Slot::default(); capacity].into_boxed_slice(),
            cursor: 0,
            live: 0,
            overwrites: 0,
        }
    }

    /// Hand out the next slot in cyclic order with all fields reset
    ///
    /// If the slot is still held by an earlier transaction that record is
    /// overwritten and its handle goes stale; `overwrites` counts these.
    #[inline]
    pub fn acquire(&mut self) -> TxHandle {
        let index = (self.cursor % self.slots.len() as u64) as usize;
        self.cursor += 1;

        let slot = &mut self.slots[index];
        if slot.live {
            self.overwrites += 1;
        } else {
            self.live += 1;
        }

        slot.generation = slot.generation.wrapping_add(1);
        slot.live = true;
        slot.record = Transaction::default();

        TxHandle {
            index: index as u32,
            generation: slot.generation,
        }
    }

    #[inline]
    fn slot(&self, handle: TxHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.live && slot.generation == handle.generation)
    }

    /// Record behind `handle`, or `None` if the handle is stale
    #[inline]
    pub fn get(&self, handle: TxHandle) -> Option<&Transaction> {
        self.slot(handle).map(|slot| &slot.record)
    }

    /// Mutable record behind `handle`, or `None` if the handle is stale
    #[inline]
    pub fn get_mut(&mut self, handle: TxHandle) -> Option<&mut Transaction> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &mut slot.record)
    }

    /// Whether `handle` still refers to its original occupant
    #[inline]
    pub fn is_live(&self, handle: TxHandle) -> bool {
        self.slot(handle).is_some()
    }

    /// Move the record out and free the slot
    ///
    /// Returns `None` (and changes nothing) for stale handles.
    pub fn release(&mut self, handle: TxHandle) -> Option<Transaction> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.live && slot.generation == handle.generation)?;

        slot.live = false;
        self.live -= 1;
        Some(slot.record)
    }

    /// Free every slot and invalidate every outstanding handle
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.live {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.cursor = 0;
        self.live = 0;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently held by the pipeline
    pub fn live(&self) -> usize {
        self.live
    }

    /// Total acquisitions that landed on a live slot
    pub fn overwrites(&self) -> u64 {
        self.overwrites
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats::from_arena(self)
    }
}

/// Arena statistics for monitoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaStats {
    pub capacity: usize,
    pub live: usize,
    pub utilization: f64,
    pub overwrites: u64,
}

impl ArenaStats {
    pub fn from_arena(arena: &TransactionArena) -> Self {
        let capacity = arena.capacity();
        let live = arena.live();

        Self {
            capacity,
            live,
            utilization: live as f64 / capacity as f64,
            overwrites: arena.overwrites(),
        }
    }

    /// Check if arena is near exhaustion (>90% utilized)
    pub fn is_near_exhaustion(&self) -> bool {
        self.utilization > 0.9
    }
}
