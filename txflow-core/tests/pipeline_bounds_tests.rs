//! Integration tests for buffer bounds under load
//!
//! Tests verify:
//! 1. Intake queue and completed ring never exceed their capacity
//! 2. The hft scenario (10,000 tx over 1s) stays within bounds
//! 3. Refusals and overwrites are accounted for, never silent

use anyhow::Result;
use proptest::prelude::*;
use txflow_core::config::{Mode, PipelineConfig};
use txflow_core::testing::{config_for_mode, test_state};

/// 100 ticks of 10ms in hft mode without any completion firing
#[test]
fn test_hft_second_stays_bounded() -> Result<()> {
    let config = config_for_mode(Mode::Hft, 7);
    let mut state = test_state(&config);

    for tick in 0..100 {
        state.tick(10, tick * 10);
        assert!(state.queue_len() <= config.max_queue_size);
        assert!(state.processing_len() <= Mode::Hft.profile().concurrency_limit);
    }

    let metrics = state.metrics().snapshot();
    assert_eq!(metrics.generated + metrics.refused, 10_000);
    assert_eq!(metrics.generated, 10_000);
    assert_eq!(state.queue_len() + state.processing_len(), 10_000);

    Ok(())
}

/// A small intake queue refuses the overflow and counts it as dropped
#[test]
fn test_hft_refusals_counted_as_dropped() -> Result<()> {
    let config = PipelineConfig {
        max_queue_size: 1_000,
        ..config_for_mode(Mode::Hft, 8)
    };
    let mut state = test_state(&config);

    for tick in 0..100 {
        state.tick(10, tick * 10);
    }
    let stats = state.refresh_stats(1_000);

    assert_eq!(state.queue_len(), 1_000);
    let metrics = state.metrics().snapshot();
    assert_eq!(metrics.generated + metrics.refused, 10_000);
    assert_eq!(stats.dropped_messages, metrics.refused);
    assert_eq!(stats.queue_size, 1_000);

    Ok(())
}

/// Pool smaller than the queue: overwritten slots surface as stale handles
#[test]
fn test_pool_wrap_discards_stale_handles() -> Result<()> {
    let config = PipelineConfig {
        pool_size: 1_000,
        max_queue_size: 5_000,
        ..config_for_mode(Mode::Stress, 9)
    };
    let mut state = test_state(&config);

    // 1,500 transactions in one tick; 500 land on slots still queued
    let report = state.tick(1_500, 0);
    assert_eq!(report.generated, 1_500);
    assert_eq!(state.arena_stats().overwrites, 500);

    let metrics = state.metrics().snapshot();
    assert_eq!(metrics.stale_discarded, 500);
    assert_eq!(report.dispatched.len(), 50);
    assert_eq!(state.queue_len(), 1_000 - 50);

    Ok(())
}

#[derive(Debug, Clone)]
enum Step {
    Tick(u64),
    CompleteAll,
    SwitchMode(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0u64..200).prop_map(Step::Tick),
        2 => Just(Step::CompleteAll),
        1 => (0usize..4).prop_map(Step::SwitchMode),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_buffers_never_exceed_capacity(
        steps in proptest::collection::vec(step(), 1..60),
        queue_cap in 1usize..300,
        completed_cap in 1usize..300,
        seed in any::<u64>(),
    ) {
        let config = PipelineConfig {
            max_queue_size: queue_cap,
            max_completed_size: completed_cap,
            seed: Some(seed),
            ..Default::default()
        };
        let mut state = test_state(&config);
        let mut now_ms = 0i64;

        for step in steps {
            match step {
                Step::Tick(elapsed) => {
                    now_ms += elapsed as i64;
                    state.tick(elapsed, now_ms);
                }
                Step::CompleteAll => {
                    for dispatch in state.in_flight() {
                        state.complete(dispatch.handle);
                    }
                }
                Step::SwitchMode(i) => state.set_mode(Mode::ALL[i]),
            }

            prop_assert!(state.queue_len() <= queue_cap);
            prop_assert!(state.completed().len() <= completed_cap);
            prop_assert!(state.processing_len() <= Mode::busiest_concurrency_limit());

            let stats = state.stats();
            prop_assert_eq!(stats.bucket_total(), stats.total_processed);
        }
    }
}
