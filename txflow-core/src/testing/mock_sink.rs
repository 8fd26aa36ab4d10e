//! Mock trade sink for testing
//!
//! Programmable stand-in for the price engine: records every submission
//! and answers with a configured acknowledgement or failure.

use crate::core::ReportError;
use crate::reporter::{TradeAck, TradeReport, TradeSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// How the mock answers submissions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkBehavior {
    /// Accept every trade with this acknowledgement
    Accept(TradeAck),
    /// Answer every trade with this HTTP status
    Reject(u16),
    /// Fail as if the engine were unreachable
    Unavailable,
}

pub struct MockTradeSink {
    behavior: Mutex<SinkBehavior>,
    received: Mutex<Vec<TradeReport>>,
    submissions: AtomicU64,
}

impl MockTradeSink {
    pub fn new(behavior: SinkBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            received: Mutex::new(Vec::new()),
            submissions: AtomicU64::new(0),
        }
    }

    /// Accept everything with an empty acknowledgement
    pub fn accepting() -> Self {
        Self::new(SinkBehavior::Accept(TradeAck::default()))
    }

    /// Accept everything, answering with `newPrice`
    pub fn repricing(new_price: f64) -> Self {
        Self::new(SinkBehavior::Accept(TradeAck {
            trade: None,
            new_price: Some(new_price),
        }))
    }

    pub fn unavailable() -> Self {
        Self::new(SinkBehavior::Unavailable)
    }

    pub fn set_behavior(&self, behavior: SinkBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Reports received so far (including rejected ones)
    pub fn received(&self) -> Vec<TradeReport> {
        self.received.lock().clone()
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TradeSink for MockTradeSink {
    async fn submit(&self, report: &TradeReport) -> Result<TradeAck, ReportError> {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.received.lock().push(report.clone());

        let behavior = *self.behavior.lock();
        match behavior {
            SinkBehavior::Accept(ack) => Ok(ack),
            SinkBehavior::Reject(status) => Err(ReportError::Status { status }),
            SinkBehavior::Unavailable => {
                Err(ReportError::Unavailable("mock price engine offline".to_string()))
            }
        }
    }
}
