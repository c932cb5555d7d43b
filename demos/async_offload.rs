//! Async offload example
//!
//! Builds a small logger hierarchy, routes it through an async handler and
//! prints every event from the worker thread.
//!
//! Run with: cargo run --example async_offload

use rust_log_manager::core::LogEvent;
use rust_log_manager::prelude::*;
use rust_log_manager::{info, warn};
use std::sync::Arc;
use std::thread;

/// Prints one line per event to stdout
struct PrintHandler {
    base: HandlerBase,
}

impl Handler for PrintHandler {
    fn publish(&self, event: &LogEvent) -> Result<()> {
        if !self.base.is_loggable(event) {
            return Ok(());
        }
        let thread = event.thread_name().unwrap_or_else(|| event.thread_id());
        let ndc = event.ndc();
        println!(
            "{} [{}] {} <{}>{}{} {}",
            event.timestamp().format("%H:%M:%S%.3f"),
            event.level(),
            event.logger_name(),
            thread,
            if ndc.is_empty() { "" } else { " " },
            ndc,
            event.formatted_message()
        );
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.base.mark_closed();
        Ok(())
    }

    fn name(&self) -> &str {
        self.base.name()
    }
}

fn main() -> Result<()> {
    println!("=== Rust Log Manager - Async Offload Example ===\n");

    let context = LogContext::new(false);
    let offload = Arc::new(
        AsyncHandler::builder()
            .name("stdout-offload")
            .queue_length(256)
            .overflow(OverflowPolicy::Block)
            .target(Arc::new(PrintHandler {
                base: HandlerBase::new("stdout"),
            }))
            .build()?,
    );
    context.root_logger().add_handler(offload.clone());

    // Quiet everything under "app.db" except warnings
    let mut levels = LevelConfig::default();
    levels.root = Some("DEBUG".into());
    levels.loggers.insert("app.db".into(), "WARN".into());
    context.apply_levels(&levels)?;

    let http = context.logger("app.http");
    let db = context.logger("app.db.pool");

    info!(http, "listening on port {}", 8080);
    db.info("hidden by app.db level");
    warn!(db, "pool exhausted, {} waiters", 3);

    let workers = (0..3)
        .map(|id| {
            let http = http.clone();
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    let _frame = Ndc::scoped(format!("req-{}", id));
                    for i in 0..3 {
                        http.debug(format!("handled request {}", i));
                    }
                })
                .map_err(LoggerError::from)
        })
        .collect::<Result<Vec<_>>>()?;

    for worker in workers {
        let _ = worker.join();
    }

    offload.close()?;

    let metrics = offload.metrics();
    println!(
        "\nforwarded {} event(s), dropped {}, producers blocked {} time(s)",
        metrics.forwarded(),
        metrics.dropped_count(),
        metrics.block_events()
    );

    Ok(())
}
