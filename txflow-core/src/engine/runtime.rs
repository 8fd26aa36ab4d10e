//! Async pipeline driver
//!
//! ```text
//!            PipelineHandle ── Command ──┐
//!                                        ▼
//!   interval(tick) ──▶ Pipeline::run ──▶ PipelineState (Mutex)
//!                          │                   ▲
//!                          ├─ JoinSet<timer> ──┘ complete(handle)
//!                          │        └──▶ DownstreamReporter::report
//!                          └─ watch<ProcessingStats> ──▶ subscribers
//! ```
//!
//! One task owns the tick loop and the completion timers. Every dispatched
//! transaction gets a one-shot timer in the `JoinSet`; pausing aborts them
//! all (their transactions stay `processing`) and resuming re-arms them
//! from the state's in-flight set.

use super::market::PriceReference;
use super::pipeline::{is_reportable, PipelineState};
use super::processor::Dispatch;
use super::stats::ProcessingStats;
use crate::config::{Mode, PipelineConfig};
use crate::core::{PipelineClosed, ReportError, Transaction};
use crate::perf::{MetricsSnapshot, PipelineMetrics, TxHandle};
use crate::reporter::{DownstreamReporter, HttpTradeSink, TradeSink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Control messages accepted by the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetMode(Mode),
    SetOptimized(bool),
    SetSendToBackend(bool),
    Pause,
    Resume,
    Reset,
    Shutdown,
}

/// Pipeline driver; consumed by `run`
pub struct Pipeline {
    state: Arc<Mutex<PipelineState>>,
    reporter: Arc<DownstreamReporter>,
    metrics: Arc<PipelineMetrics>,
    commands: mpsc::UnboundedReceiver<Command>,
    stats_tx: watch::Sender<ProcessingStats>,
    timers: JoinSet<()>,
    paused: bool,
}

/// Control surface of a running pipeline (cheap to clone)
#[derive(Clone)]
pub struct PipelineHandle {
    commands: mpsc::UnboundedSender<Command>,
    stats: watch::Receiver<ProcessingStats>,
    state: Arc<Mutex<PipelineState>>,
    reporter: Arc<DownstreamReporter>,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    /// Build a pipeline reporting through `sink`
    ///
    /// `config` is expected to be validated.
    pub fn new(config: &PipelineConfig, sink: Arc<dyn TradeSink>) -> (Self, PipelineHandle) {
        let metrics = Arc::new(PipelineMetrics::new());
        let price = PriceReference::new(config.base_price);

        let state = Arc::new(Mutex::new(PipelineState::new(
            config,
            price.clone(),
            Arc::clone(&metrics),
        )));
        let reporter = Arc::new(DownstreamReporter::new(
            &config.reporter,
            sink,
            price,
            Arc::clone(&metrics),
        ));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (stats_tx, stats_rx) = watch::channel(ProcessingStats::default());

        let handle = PipelineHandle {
            commands: command_tx,
            stats: stats_rx,
            state: Arc::clone(&state),
            reporter: Arc::clone(&reporter),
            metrics: Arc::clone(&metrics),
        };

        let pipeline = Self {
            state,
            reporter,
            metrics,
            commands: command_rx,
            stats_tx,
            timers: JoinSet::new(),
            paused: false,
        };

        (pipeline, handle)
    }

    /// Build a pipeline reporting to the configured price engine over HTTP
    pub fn with_http_sink(config: &PipelineConfig) -> Result<(Self, PipelineHandle), ReportError> {
        let sink = HttpTradeSink::new(&config.reporter)?;
        info!(endpoint = sink.endpoint(), "reporting trades over HTTP");
        Ok(Self::new(config, Arc::new(sink)))
    }

    /// Run the driver on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive the pipeline until `Shutdown` or every handle is dropped
    pub async fn run(mut self) {
        let mode = self.state.lock().mode();
        let mut ticker = ticker_for(mode);
        let mut last_tick = Instant::now();

        info!(%mode, "pipeline started");

        loop {
            tokio::select! {
                _ = ticker.tick(), if !self.paused => {
                    let elapsed_ms = take_elapsed_ms(&mut last_tick, Instant::now());
                    self.on_tick(elapsed_ms);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command, &mut ticker, &mut last_tick).await,
                },
            }
        }

        let outstanding = self.cancel_timers().await;
        info!(outstanding, "pipeline stopped");
    }

    fn on_tick(&mut self, elapsed_ms: u64) {
        self.reap_timers();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let (report, stats) = {
            let mut state = self.state.lock();
            let report = state.tick(elapsed_ms, now_ms);
            (report, state.stats())
        };

        for dispatch in report.dispatched {
            self.arm(dispatch);
        }
        for tx in &report.reportable {
            self.reporter.report(tx);
        }

        self.publish(stats);
    }

    async fn apply(&mut self, command: Command, ticker: &mut Interval, last_tick: &mut Instant) {
        debug!(?command, "control command");

        match command {
            Command::SetMode(mode) => {
                self.state.lock().set_mode(mode);
                *ticker = ticker_for(mode);
            }
            Command::SetOptimized(optimized) => {
                let stats = {
                    let mut state = self.state.lock();
                    state.set_optimized(optimized);
                    state.stats()
                };
                self.publish(stats);
            }
            Command::SetSendToBackend(enabled) => {
                self.reporter.set_enabled(enabled);
                info!(enabled, "send to backend toggled");
            }
            Command::Pause => {
                if !self.paused {
                    self.paused = true;
                    let cancelled = self.cancel_timers().await;
                    self.metrics.add_cancelled_timers(cancelled as u64);
                    info!(cancelled, "pipeline paused");
                }
            }
            Command::Resume => {
                if self.paused {
                    self.paused = false;
                    *last_tick = Instant::now();
                    ticker.reset();

                    let in_flight = self.state.lock().in_flight();
                    let rearmed = in_flight.len();
                    for dispatch in in_flight {
                        self.arm(dispatch);
                    }
                    info!(rearmed, "pipeline resumed");
                }
            }
            Command::Reset => {
                self.cancel_timers().await;
                let stats = {
                    let mut state = self.state.lock();
                    state.reset();
                    state.stats()
                };
                self.publish(stats);
            }
            Command::Shutdown => {}
        }
    }

    /// Start the completion timer for a dispatched transaction
    fn arm(&mut self, dispatch: Dispatch) {
        let state = Arc::clone(&self.state);
        let reporter = Arc::clone(&self.reporter);
        let delay = Duration::from_secs_f64(dispatch.delay_ms.max(0.0) / 1_000.0);

        self.timers.spawn(async move {
            time::sleep(delay).await;
            let finished = state.lock().complete(dispatch.handle);
            if let Some(tx) = finished.filter(is_reportable) {
                reporter.report(&tx);
            }
        });
    }

    /// Drop finished timer tasks
    fn reap_timers(&mut self) {
        while self.timers.try_join_next().is_some() {}
    }

    /// Abort every pending timer, returning how many were actually aborted
    ///
    /// Timers that finished before the abort landed are not counted.
    async fn cancel_timers(&mut self) -> usize {
        self.timers.abort_all();

        let mut cancelled = 0;
        while let Some(result) = self.timers.join_next().await {
            if matches!(&result, Err(e) if e.is_cancelled()) {
                cancelled += 1;
            }
        }
        cancelled
    }

    fn publish(&self, stats: ProcessingStats) {
        self.stats_tx.send_if_modified(|current| {
            if *current != stats {
                *current = stats;
                true
            } else {
                false
            }
        });
    }
}

/// Whole milliseconds since `last`, advancing it by exactly that much
///
/// The sub-millisecond remainder stays behind and counts toward the next tick.
fn take_elapsed_ms(last: &mut Instant, now: Instant) -> u64 {
    let elapsed_ms = now.saturating_duration_since(*last).as_millis() as u64;
    *last += Duration::from_millis(elapsed_ms);
    elapsed_ms
}

fn ticker_for(mode: Mode) -> Interval {
    let mut ticker = time::interval(mode.profile().tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

impl PipelineHandle {
    fn send(&self, command: Command) -> Result<(), PipelineClosed> {
        self.commands.send(command).map_err(|_| PipelineClosed)
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), PipelineClosed> {
        self.send(Command::SetMode(mode))
    }

    pub fn set_optimized(&self, optimized: bool) -> Result<(), PipelineClosed> {
        self.send(Command::SetOptimized(optimized))
    }

    pub fn set_send_to_backend(&self, enabled: bool) -> Result<(), PipelineClosed> {
        self.send(Command::SetSendToBackend(enabled))
    }

    pub fn pause(&self) -> Result<(), PipelineClosed> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), PipelineClosed> {
        self.send(Command::Resume)
    }

    pub fn reset(&self) -> Result<(), PipelineClosed> {
        self.send(Command::Reset)
    }

    pub fn shutdown(&self) -> Result<(), PipelineClosed> {
        self.send(Command::Shutdown)
    }

    /// Latest published statistics
    pub fn stats(&self) -> ProcessingStats {
        self.stats.borrow().clone()
    }

    /// Recompute statistics now instead of waiting for the next refresh
    pub fn refresh_stats(&self) -> ProcessingStats {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.state.lock().refresh_stats(now_ms)
    }

    /// Receiver notified whenever published statistics change
    pub fn subscribe(&self) -> watch::Receiver<ProcessingStats> {
        self.stats.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Inject a transaction into the intake queue
    pub fn inject(&self, tx: Transaction) -> TxHandle {
        self.state.lock().enqueue(tx)
    }

    /// Inspect the pipeline state under its lock
    pub fn with_state<R>(&self, f: impl FnOnce(&PipelineState) -> R) -> R {
        f(&*self.state.lock())
    }

    pub fn send_to_backend(&self) -> bool {
        self.reporter.is_enabled()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTradeSink;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_counts_only_aborted_timers() {
        let sink = Arc::new(MockTradeSink::accepting());
        let (mut pipeline, _handle) = Pipeline::new(&PipelineConfig::default(), sink);

        // Finished but not yet reaped when the cancel arrives
        pipeline.timers.spawn(async {});
        for _ in 0..2 {
            pipeline.timers.spawn(time::sleep(Duration::from_secs(3_600)));
        }
        time::sleep(Duration::from_millis(1)).await;

        assert_eq!(pipeline.cancel_timers().await, 2);
        assert!(pipeline.timers.is_empty());
    }

    #[test]
    fn test_elapsed_carries_sub_millisecond_remainder() {
        let start = Instant::now();
        let mut last = start;

        // Ten ticks each 1.4ms late would lose 4ms if truncated
        let mut total = 0;
        for i in 1..=10u64 {
            total += take_elapsed_ms(&mut last, start + Duration::from_micros(11_400 * i));
        }

        assert_eq!(total, 114);
        assert_eq!(last, start + Duration::from_millis(114));
    }

    #[test]
    fn test_elapsed_never_negative() {
        let start = Instant::now();
        let mut last = start + Duration::from_millis(5);

        assert_eq!(take_elapsed_ms(&mut last, start), 0);
        assert_eq!(last, start + Duration::from_millis(5));
    }
}
