//! Downstream trade reporting
//!
//! Completed trades are forwarded to the price engine without ever blocking
//! or failing the pipeline:
//!
//! ```text
//! report(tx) ──▶ enabled? ──▶ throttle ──▶ tokio::spawn(deliver)
//!                                              │
//!                         ┌────────────────────┴───────────────────┐
//!                      Ok(ack)                                   Err(e)
//!               reports_sent += 1                        reports_failed += 1
//!               base price ← ack price              error! (first N, cooldown)
//! ```
//!
//! The transport sits behind the `TradeSink` trait; `HttpTradeSink` is the
//! production implementation.

pub mod http;
pub mod log_limiter;
pub mod throttle;

pub use http::HttpTradeSink;
pub use log_limiter::FailureLogLimiter;
pub use throttle::{SubmissionThrottle, ThrottleConfig};

use crate::config::ReporterConfig;
use crate::core::{Action, ReportError, Transaction};
use crate::engine::PriceReference;
use crate::perf::PipelineMetrics;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Trade submission body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReport {
    pub id: String,
    pub trader_id: String,
    pub trader_name: String,
    pub action: Action,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: i64,
}

impl TradeReport {
    /// Build the submission for a finished trade
    ///
    /// `None` for anything that is not a priced trade with a direction.
    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        if !tx.is_trade() {
            return None;
        }

        Some(Self {
            id: tx.id.to_string(),
            trader_id: tx.trader.to_string(),
            trader_name: format!("Synthetic Trader {:03}", tx.trader.0),
            action: tx.action?,
            price: tx.price?,
            quantity: tx.size,
            timestamp: tx.timestamp_ms,
        })
    }
}

/// Executed price echoed by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct AckTrade {
    pub price: Option<f64>,
}

/// Price engine response; every field optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct TradeAck {
    #[serde(default)]
    pub trade: Option<AckTrade>,
    #[serde(default, rename = "newPrice")]
    pub new_price: Option<f64>,
}

impl TradeAck {
    /// Price to adopt as the new base: `newPrice`, else `trade.price`
    pub fn effective_price(&self) -> Option<f64> {
        self.new_price.or_else(|| self.trade.and_then(|t| t.price))
    }
}

/// Trade transport
#[async_trait]
pub trait TradeSink: Send + Sync {
    async fn submit(&self, report: &TradeReport) -> Result<TradeAck, ReportError>;
}

/// Fire-and-forget reporter shared by the runtime and its completion timers
pub struct DownstreamReporter {
    sink: Arc<dyn TradeSink>,
    enabled: AtomicBool,
    throttle: Option<SubmissionThrottle>,
    log_limiter: Mutex<FailureLogLimiter>,
    price: PriceReference,
    metrics: Arc<PipelineMetrics>,
}

impl DownstreamReporter {
    pub fn new(
        config: &ReporterConfig,
        sink: Arc<dyn TradeSink>,
        price: PriceReference,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            sink,
            enabled: AtomicBool::new(config.enabled),
            throttle: SubmissionThrottle::from_rate(config.max_reports_per_second),
            log_limiter: Mutex::new(FailureLogLimiter::new(
                config.max_logged_failures,
                Duration::from_secs(config.failure_log_cooldown_secs),
            )),
            price,
            metrics,
        }
    }

    /// "Send to backend" toggle
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Submit a finished trade in the background
    ///
    /// Returns the delivery task, or `None` if nothing was sent (reporting
    /// disabled, not a reportable trade, or throttled).
    pub fn report(self: &Arc<Self>, tx: &Transaction) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            return None;
        }

        let report = TradeReport::from_transaction(tx)?;

        if let Some(throttle) = &self.throttle {
            if !throttle.allow() {
                self.metrics.inc_reports_throttled();
                return None;
            }
        }

        let reporter = Arc::clone(self);
        Some(tokio::spawn(async move {
            // Outcome is fully accounted for inside deliver
            let _ = reporter.deliver(&report).await;
        }))
    }

    /// Submit one report and account for the outcome
    pub async fn deliver(&self, report: &TradeReport) -> Result<TradeAck, ReportError> {
        match self.sink.submit(report).await {
            Ok(ack) => {
                self.metrics.inc_reports_sent();
                if let Some(price) = ack.effective_price() {
                    if self.price.set(price) {
                        debug!(price, "base price updated from price engine");
                    }
                }
                Ok(ack)
            }
            Err(e) => {
                self.metrics.inc_reports_failed();
                if self.log_limiter.lock().should_log(Instant::now()) {
                    error!(id = %report.id, error = %e, "failed to report trade to price engine");
                }
                Err(e)
            }
        }
    }

    /// Failures logged so far
    pub fn logged_failures(&self) -> u32 {
        self.log_limiter.lock().logged()
    }

    pub fn price(&self) -> &PriceReference {
        &self.price
    }
}
