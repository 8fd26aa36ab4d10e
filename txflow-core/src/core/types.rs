//! Core transaction types
//!
//! All types in this module are designed for:
//! - Zero heap allocations (records live in the arena and are `Copy`)
//! - Single byte enums where possible
//! - Monotonic status transitions checked at the type level

use super::errors::TransitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a transaction
///
/// Uses u128 instead of String for zero-allocation, copy semantics.
/// Format: [monotonic nanos:64][random:32][counter:32]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TransactionId(pub u128);

impl TransactionId {
    /// Create a new TransactionId from a u128
    #[inline(always)]
    pub const fn new(id: u128) -> Self {
        Self(id)
    }

    /// Compose an id from a monotonic clock reading, a random suffix and a
    /// per-generator counter.
    #[inline]
    pub fn compose(monotonic_nanos: u64, suffix: u32, counter: u32) -> Self {
        Self(((monotonic_nanos as u128) << 64) | ((suffix as u128) << 32) | (counter as u128))
    }

    /// Monotonic component (upper 64 bits)
    #[inline(always)]
    pub const fn monotonic_nanos(&self) -> u64 {
        (self.0 >> 64) as u64
    }

    /// Random component (bits 32-63)
    #[inline(always)]
    pub const fn suffix(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Counter component (lower 32 bits)
    #[inline(always)]
    pub const fn counter(&self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx-{}-{:08x}{:08x}",
            self.monotonic_nanos(),
            self.suffix(),
            self.counter()
        )
    }
}

/// Kind of synthetic trading activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionKind {
    #[default]
    Trade = 0,
    OrderPlace = 1,
    OrderCancel = 2,
    Liquidation = 3,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Trade,
        TransactionKind::OrderPlace,
        TransactionKind::OrderCancel,
        TransactionKind::Liquidation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::OrderPlace => "order_place",
            Self::OrderCancel => "order_cancel",
            Self::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority
///
/// Ordered so that `Critical > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction lifecycle status
///
/// ```text
/// Pending ──▶ Processing ──┬──▶ Completed (terminal)
///                          └──▶ Failed    (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionStatus {
    #[default]
    Pending = 0,
    Processing = 1,
    Completed = 2,
    Failed = 3,
}

impl TransactionStatus {
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Validate a transition, returning the new status.
    pub fn transition(self, next: TransactionStatus) -> Result<TransactionStatus, TransitionError> {
        match (self, next) {
            (Self::Pending, Self::Processing)
            | (Self::Processing, Self::Completed)
            | (Self::Processing, Self::Failed) => Ok(next),
            (from, to) => Err(TransitionError::Illegal { from, to }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of simulated processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

impl From<Outcome> for TransactionStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => TransactionStatus::Completed,
            Outcome::Failed => TransactionStatus::Failed,
        }
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Action {
    Buy = 0,
    Sell = 1,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "buy"),
            Action::Sell => write!(f, "sell"),
        }
    }
}

/// Synthetic trader identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TraderId(pub u16);

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trader-{:03}", self.0)
    }
}

/// A synthetic unit of simulated trading activity
///
/// `Copy` so that completion can move the record out of its arena slot into
/// the completed ring without touching the heap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transaction {
    pub id: TransactionId,
    /// Wall-clock creation time (Unix milliseconds)
    pub timestamp_ms: i64,
    pub kind: TransactionKind,
    pub priority: Priority,
    pub status: TransactionStatus,
    /// Simulated latency, set once the transaction leaves `Processing`
    pub processing_time_ms: Option<f64>,
    pub size: f64,
    pub trader: TraderId,
    pub action: Option<Action>,
    pub price: Option<f64>,
}

impl Transaction {
    /// Pending -> Processing
    pub fn begin_processing(&mut self) -> Result<(), TransitionError> {
        self.status = self.status.transition(TransactionStatus::Processing)?;
        Ok(())
    }

    /// Processing -> Completed | Failed, recording the simulated latency
    pub fn finish(&mut self, outcome: Outcome, latency_ms: f64) -> Result<(), TransitionError> {
        self.status = self.status.transition(outcome.into())?;
        self.processing_time_ms = Some(latency_ms);
        Ok(())
    }

    #[inline(always)]
    pub fn is_trade(&self) -> bool {
        self.kind == TransactionKind::Trade
    }

    #[inline(always)]
    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_transaction_id_components() {
        let id = TransactionId::compose(123_456, 0xdead_beef, 7);
        assert_eq!(id.monotonic_nanos(), 123_456);
        assert_eq!(id.suffix(), 0xdead_beef);
        assert_eq!(id.counter(), 7);
        assert_eq!(id.to_string(), "tx-123456-deadbeef00000007");
    }

    #[test]
    fn test_status_happy_path() {
        let mut tx = Transaction::default();
        assert_eq!(tx.status, TransactionStatus::Pending);

        tx.begin_processing().unwrap();
        assert_eq!(tx.status, TransactionStatus::Processing);
        assert_eq!(tx.processing_time_ms, None);

        tx.finish(Outcome::Completed, 0.42).unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.processing_time_ms, Some(0.42));
    }

    #[test]
    fn test_terminal_states_cannot_be_left() {
        for terminal in [TransactionStatus::Completed, TransactionStatus::Failed] {
            for next in [
                TransactionStatus::Pending,
                TransactionStatus::Processing,
                TransactionStatus::Completed,
                TransactionStatus::Failed,
            ] {
                assert!(terminal.transition(next).is_err(), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn test_pending_cannot_skip_processing() {
        let mut tx = Transaction::default();
        let err = tx.finish(Outcome::Failed, 1.0).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                from: TransactionStatus::Pending,
                to: TransactionStatus::Failed
            }
        );
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.processing_time_ms, None);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(TraderId(7).to_string(), "trader-007");
        assert_eq!(TransactionKind::OrderCancel.to_string(), "order_cancel");
        assert_eq!(Action::Sell.to_string(), "sell");
    }
}
