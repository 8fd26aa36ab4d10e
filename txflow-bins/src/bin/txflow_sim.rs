//! Pipeline simulator
//!
//! Runs the transaction pipeline in one mode for a fixed duration (or until
//! Ctrl-C), logging statistics periodically. Completed trades go to the
//! price engine when `--backend-url` is given or the config enables it.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::time::{self, Instant};
use txflow_bins::common::{init_logging, print_stats, CommonArgs};
use txflow_core::engine::Pipeline;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the txflow transaction pipeline")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Run duration in seconds (0 runs until Ctrl-C)
    #[arg(short, long, default_value = "10")]
    duration: u64,

    /// Seconds between statistics log lines
    #[arg(long, default_value = "1")]
    stats_every: u64,

    /// Price engine base URL; enables trade reporting
    #[arg(long)]
    backend_url: Option<String>,

    /// Simulation the reported trades belong to
    #[arg(long)]
    simulation_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = args.common.load_config()?;
    if let Some(url) = args.backend_url {
        config.reporter.enabled = true;
        config.reporter.base_url = url;
    }
    if let Some(id) = args.simulation_id {
        config.reporter.simulation_id = id;
    }
    config.validate().context("Invalid reporter settings")?;

    init_logging(&config)?;

    tracing::info!("=== txflow: pipeline simulator ===");
    tracing::info!(
        "Mode: {} | optimized: {} | send to backend: {}",
        config.initial_mode,
        config.optimized,
        config.reporter.enabled
    );

    let (pipeline, handle) =
        Pipeline::with_http_sink(&config).context("Failed to build trade reporter")?;
    let driver = pipeline.spawn();

    let deadline = (args.duration > 0).then(|| Instant::now() + Duration::from_secs(args.duration));
    let run_until = async {
        match deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(run_until);

    let mut stats_log = time::interval(Duration::from_secs(args.stats_every.max(1)));
    stats_log.tick().await;

    loop {
        tokio::select! {
            _ = stats_log.tick() => {
                let stats = handle.stats();
                tracing::info!(
                    processed = stats.total_processed,
                    throughput = stats.throughput_per_second,
                    queue = stats.queue_size,
                    processing = stats.processing_count,
                    dropped = stats.dropped_messages,
                    avg_ms = stats.average_processing_time,
                    "pipeline stats"
                );
            }
            _ = &mut run_until => {
                tracing::info!("Run duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    let stats = handle.refresh_stats();
    handle.shutdown()?;
    driver.await.context("Pipeline task panicked")?;

    print_stats(&stats, &handle.metrics());
    Ok(())
}
