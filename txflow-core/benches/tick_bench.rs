//! Pipeline Tick Benchmarks
//!
//! Hot-path cost of one generation + scheduling tick and of the completion
//! path, per mode.
//! Target: an hft tick (100 transactions) well under the 10ms tick interval.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use txflow_core::config::Mode;
use txflow_core::core::{Priority, TransactionKind};
use txflow_core::engine::{IntakeQueue, Scheduler};
use txflow_core::perf::{PipelineMetrics, TransactionArena};
use txflow_core::testing::{config_for_mode, test_state};

/// Benchmark: Full tick per mode, completions drained each iteration
fn bench_tick_per_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_tick");

    for mode in Mode::ALL {
        let config = config_for_mode(mode, 42);
        let mut state = test_state(&config);
        let tick_ms = mode.profile().tick_interval.as_millis() as u64;
        let mut now_ms = 0i64;

        group.bench_with_input(BenchmarkId::from_parameter(mode), &tick_ms, |b, &tick_ms| {
            b.iter(|| {
                now_ms += tick_ms as i64;
                let report = state.tick(black_box(tick_ms), now_ms);
                for dispatch in &report.dispatched {
                    black_box(state.complete(dispatch.handle));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: Priority admission from a deep queue
fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_admission");

    for depth in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let metrics = PipelineMetrics::new();
            let mut scheduler = Scheduler::new();

            b.iter_batched(
                || {
                    let mut arena = TransactionArena::new(depth * 2);
                    let mut intake = IntakeQueue::new(depth);
                    for i in 0..depth {
                        let handle = arena.acquire();
                        if let Some(tx) = arena.get_mut(handle) {
                            tx.kind = TransactionKind::Trade;
                            tx.priority = Priority::ALL[i % 4];
                        }
                        intake.push(handle);
                    }
                    (arena, intake)
                },
                |(arena, mut intake)| {
                    black_box(scheduler.admit(&mut intake, &arena, 0, 100, &metrics));
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick_per_mode, bench_admission);
criterion_main!(benches);
