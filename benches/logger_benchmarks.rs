//! Criterion benchmarks for rust_log_manager

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_manager::core::{FormatStyle, LogEvent};
use rust_log_manager::prelude::*;
use std::sync::Arc;

// ============================================================================
// Level Check Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let context = LogContext::new(false);
    let logger = context.logger("bench.deep.logger.name");
    context.logger("bench").set_level(Some(LogLevel::Warn));

    group.bench_function("is_loggable_rejected", |b| {
        b.iter(|| black_box(logger.is_loggable(black_box(LogLevel::Debug))));
    });

    group.bench_function("debug_rejected", |b| {
        b.iter(|| logger.debug(black_box("never formatted")));
    });

    group.bench_function("macro_rejected", |b| {
        b.iter(|| rust_log_manager::debug!(logger, "value {}", black_box(42)));
    });

    group.finish();
}

// ============================================================================
// Lookup Benchmarks
// ============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(1));

    let context = LogContext::new(true);
    let held = context.logger("app.service.component");

    group.bench_function("existing_logger", |b| {
        b.iter(|| black_box(context.logger(black_box("app.service.component"))));
    });

    group.bench_function("set_level_propagation", |b| {
        for i in 0..100 {
            context.logger(&format!("app.service.child{}", i));
        }
        let service = context.logger("app.service");
        b.iter(|| {
            service.set_level(Some(LogLevel::Debug));
            service.set_level(None);
        });
    });

    drop(held);
    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let context = LogContext::new(false);
    let sink = Arc::new(QueueHandler::new(1024));
    context.root_logger().add_handler(sink.clone());
    context.logger("a").add_handler(sink.clone());
    context.logger("a.b").add_handler(sink.clone());
    let logger = context.logger("a.b.c");

    group.bench_function("three_level_chain", |b| {
        b.iter(|| logger.info(black_box("dispatched")));
    });

    group.bench_function("positional_params", |b| {
        b.iter(|| {
            logger.log_params(
                LogLevel::Info,
                FormatStyle::Positional,
                "user {0} did {1}",
                [FieldValue::from(42i64), FieldValue::from("login")],
            )
        });
    });

    group.bench_function("event_creation", |b| {
        b.iter(|| black_box(LogEvent::new(LogLevel::Info, black_box("event"))));
    });

    group.finish();
}

// ============================================================================
// Async Handler Benchmarks
// ============================================================================

fn bench_async_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_publish");
    group.throughput(Throughput::Elements(1));

    for (label, policy) in [
        ("block", OverflowPolicy::Block),
        ("discard", OverflowPolicy::Discard),
    ] {
        let sink = Arc::new(QueueHandler::new(64));
        let offload = AsyncHandler::builder()
            .queue_length(8192)
            .overflow(policy)
            .target(sink)
            .build()
            .unwrap();
        let event = LogEvent::new(LogLevel::Info, "queued");

        group.bench_function(label, |b| {
            b.iter(|| offload.publish(black_box(&event)).unwrap());
        });

        offload.close().unwrap();
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_level_filtering,
    bench_lookup,
    bench_dispatch,
    bench_async_publish
);

criterion_main!(benches);
