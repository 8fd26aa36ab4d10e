//! Integration tests for downstream trade reporting
//!
//! Tests verify:
//! 1. Failures are isolated, counted and logged at most N times
//! 2. Successful acknowledgements feed the base price back
//! 3. The submission throttle and the send-to-backend toggle gate traffic
//! 4. The HTTP sink speaks the price engine's wire format

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use txflow_core::config::ReporterConfig;
use txflow_core::core::{Action, ReportError};
use txflow_core::engine::PriceReference;
use txflow_core::perf::PipelineMetrics;
use txflow_core::reporter::{DownstreamReporter, HttpTradeSink, TradeReport, TradeSink};
use txflow_core::testing::{completed_trade, MockTradeSink, SinkBehavior};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn enabled_config() -> ReporterConfig {
    ReporterConfig {
        enabled: true,
        ..Default::default()
    }
}

fn reporter(
    config: &ReporterConfig,
    sink: Arc<MockTradeSink>,
) -> (Arc<DownstreamReporter>, PriceReference, Arc<PipelineMetrics>) {
    let price = PriceReference::new(50_000.0);
    let metrics = Arc::new(PipelineMetrics::new());
    let reporter = Arc::new(DownstreamReporter::new(
        config,
        sink,
        price.clone(),
        Arc::clone(&metrics),
    ));
    (reporter, price, metrics)
}

#[tokio::test]
async fn test_failures_counted_and_log_limited() -> Result<()> {
    let sink = Arc::new(MockTradeSink::unavailable());
    let (reporter, price, metrics) = reporter(&enabled_config(), Arc::clone(&sink));

    for _ in 0..100 {
        let task = reporter.report(&completed_trade(Action::Buy, 50_000.0));
        task.expect("report should be spawned").await?;
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.reports_failed, 100);
    assert_eq!(snapshot.reports_sent, 0);
    // All failures within one cooldown window: exactly one log line
    assert_eq!(reporter.logged_failures(), 1);
    assert_eq!(price.get(), 50_000.0);
    Ok(())
}

#[tokio::test]
async fn test_only_first_failures_logged_without_cooldown() -> Result<()> {
    let config = ReporterConfig {
        max_logged_failures: 5,
        failure_log_cooldown_secs: 0,
        ..enabled_config()
    };
    let sink = Arc::new(MockTradeSink::unavailable());
    let (reporter, _price, metrics) = reporter(&config, Arc::clone(&sink));

    for _ in 0..100 {
        let task = reporter.report(&completed_trade(Action::Sell, 50_000.0));
        task.expect("report should be spawned").await?;
    }

    assert_eq!(metrics.snapshot().reports_failed, 100);
    // Later failures stay silent even with no cooldown
    assert_eq!(reporter.logged_failures(), 5);
    Ok(())
}

#[tokio::test]
async fn test_success_updates_base_price() -> Result<()> {
    let sink = Arc::new(MockTradeSink::repricing(50_250.5));
    let (reporter, price, metrics) = reporter(&enabled_config(), Arc::clone(&sink));

    reporter
        .report(&completed_trade(Action::Sell, 49_990.0))
        .expect("report should be spawned")
        .await?;

    assert_eq!(price.get(), 50_250.5);
    assert_eq!(metrics.snapshot().reports_sent, 1);

    let received = sink.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].action, Action::Sell);
    assert_eq!(received[0].price, 49_990.0);
    Ok(())
}

#[tokio::test]
async fn test_recovery_after_outage() -> Result<()> {
    let sink = Arc::new(MockTradeSink::new(SinkBehavior::Reject(503)));
    let (reporter, price, metrics) = reporter(&enabled_config(), Arc::clone(&sink));
    let trade = completed_trade(Action::Buy, 50_000.0);

    reporter.report(&trade).expect("spawned").await?;
    sink.set_behavior(SinkBehavior::Accept(Default::default()));
    reporter.report(&trade).expect("spawned").await?;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.reports_failed, 1);
    assert_eq!(snapshot.reports_sent, 1);
    // Empty acknowledgement leaves the price alone
    assert_eq!(price.get(), 50_000.0);
    Ok(())
}

#[tokio::test]
async fn test_disabled_reporter_sends_nothing() -> Result<()> {
    let sink = Arc::new(MockTradeSink::accepting());
    let (reporter, _price, metrics) = reporter(&ReporterConfig::default(), Arc::clone(&sink));

    assert!(reporter.report(&completed_trade(Action::Buy, 1.0)).is_none());

    reporter.set_enabled(true);
    reporter
        .report(&completed_trade(Action::Buy, 1.0))
        .expect("spawned")
        .await?;

    assert_eq!(sink.submissions(), 1);
    assert_eq!(metrics.snapshot().reports_sent, 1);
    Ok(())
}

#[tokio::test]
async fn test_throttle_caps_burst() -> Result<()> {
    let config = ReporterConfig {
        max_reports_per_second: 10,
        ..enabled_config()
    };
    let sink = Arc::new(MockTradeSink::accepting());
    let (reporter, _price, metrics) = reporter(&config, Arc::clone(&sink));

    let tasks: Vec<_> = (0..50)
        .filter_map(|_| reporter.report(&completed_trade(Action::Buy, 100.0)))
        .collect();
    for task in tasks {
        task.await?;
    }

    let snapshot = metrics.snapshot();
    // Burst of 10, plus at most a token refilled while the loop ran
    assert!((10..=11).contains(&snapshot.reports_sent), "{:?}", snapshot);
    assert_eq!(snapshot.reports_sent + snapshot.reports_throttled, 50);
    assert_eq!(sink.submissions(), snapshot.reports_sent);
    Ok(())
}

#[tokio::test]
async fn test_http_sink_posts_trade_and_reads_new_price() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/simulation/sim-7/external-trade"))
        .and(body_partial_json(json!({
            "traderId": "trader-001",
            "action": "buy",
            "quantity": 1.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trade": { "price": 50_100.0 },
            "newPrice": 50_123.0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ReporterConfig {
        base_url: server.uri(),
        simulation_id: "sim-7".to_string(),
        ..enabled_config()
    };
    let sink = HttpTradeSink::new(&config)?;
    let report = TradeReport::from_transaction(&completed_trade(Action::Buy, 50_000.0))
        .expect("completed trade is reportable");

    let ack = sink.submit(&report).await?;
    assert_eq!(ack.effective_price(), Some(50_123.0));
    Ok(())
}

#[tokio::test]
async fn test_http_sink_maps_error_status() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = ReporterConfig {
        base_url: server.uri(),
        ..enabled_config()
    };
    let sink = HttpTradeSink::new(&config)?;
    let report = TradeReport::from_transaction(&completed_trade(Action::Sell, 1.0))
        .expect("completed trade is reportable");

    let err = sink.submit(&report).await.unwrap_err();
    assert!(matches!(err, ReportError::Status { status: 500 }));
    Ok(())
}

#[tokio::test]
async fn test_http_sink_tolerates_empty_body() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = ReporterConfig {
        base_url: server.uri(),
        ..enabled_config()
    };
    let sink = HttpTradeSink::new(&config)?;
    let report = TradeReport::from_transaction(&completed_trade(Action::Buy, 1.0))
        .expect("completed trade is reportable");

    let ack = sink.submit(&report).await?;
    assert_eq!(ack.effective_price(), None);
    Ok(())
}
