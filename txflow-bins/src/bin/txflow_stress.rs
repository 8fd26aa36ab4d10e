//! HFT stress scenario
//!
//! Runs the pipeline in hft mode (10,000 tx/s target) for a short window
//! and prints a JSON summary of queue depth, drops and throughput. Exits
//! with an error if any buffer exceeded its bound.

use anyhow::{bail, Result};
use clap::Parser;
use std::time::Duration;
use tokio::time::Instant;
use txflow_bins::common::{init_logging, print_stats, CommonArgs};
use txflow_core::config::Mode;
use txflow_core::engine::Pipeline;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the pipeline at hft rate and summarize")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Scenario length in milliseconds
    #[arg(long, default_value = "1000")]
    duration_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = args.common.load_config()?;
    if args.common.mode.is_none() {
        config.initial_mode = Mode::Hft;
    }

    init_logging(&config)?;
    tracing::info!(
        "=== txflow: {} stress for {}ms ===",
        config.initial_mode,
        args.duration_ms
    );

    let (pipeline, handle) = Pipeline::with_http_sink(&config)?;
    let started = Instant::now();
    let driver = pipeline.spawn();

    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;

    let stats = handle.refresh_stats();
    let metrics = handle.metrics();
    let elapsed = started.elapsed();
    handle.shutdown()?;
    driver.await?;

    let summary = serde_json::json!({
        "mode": config.initial_mode.as_str(),
        "elapsedMs": elapsed.as_millis() as u64,
        "generated": metrics.generated,
        "processed": stats.total_processed,
        "queueSize": stats.queue_size,
        "maxQueueSize": config.max_queue_size,
        "completedCount": stats.completed_count,
        "droppedMessages": stats.dropped_messages,
        "refused": metrics.refused,
        "throughputPerSecond": stats.throughput_per_second,
        "peakThroughput": stats.peak_throughput,
        "averageProcessingTime": stats.average_processing_time,
        "errorRate": stats.error_rate,
        "fastPathCompletions": metrics.fast_path_completions,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    print_stats(&stats, &metrics);

    if stats.queue_size > config.max_queue_size {
        bail!(
            "intake queue exceeded its bound: {} > {}",
            stats.queue_size,
            config.max_queue_size
        );
    }
    if stats.completed_count > config.max_completed_size {
        bail!(
            "completed ring exceeded its bound: {} > {}",
            stats.completed_count,
            config.max_completed_size
        );
    }

    Ok(())
}
