//! Property-based tests for rust_log_manager using proptest

use proptest::prelude::*;
use rust_log_manager::core::{LogEvent, DEFAULT_ROOT_LEVEL};
use rust_log_manager::prelude::*;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
        Just(LogLevel::Off),
    ]
}

/// Dotted names drawn from a small alphabet so that paths overlap
fn logger_name() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("c")], 1..4)
        .prop_map(|segments| segments.join("."))
}

/// Walk up to the nearest explicit level
fn nearest_explicit(context: &LogContext, name: &str) -> LogLevel {
    let mut current = Some(context.logger(name));
    while let Some(logger) = current {
        if let Some(level) = logger.level() {
            return level;
        }
        current = logger.parent();
    }
    DEFAULT_ROOT_LEVEL
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that parsing is case-insensitive
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), lower in any::<bool>()) {
        let text = if lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_uppercase()
        };
        prop_assert_eq!(text.parse::<LogLevel>().unwrap(), level);
    }

    /// Off never passes, everything else passes thresholds at or below it
    #[test]
    fn test_passes_matches_ordering(level in any_level(), threshold in any_level()) {
        let expected = level != LogLevel::Off && level >= threshold;
        prop_assert_eq!(level.passes(threshold), expected);
    }
}

// ============================================================================
// Level Inheritance Tests
// ============================================================================

proptest! {
    /// After any sequence of set/clear operations every logger's effective
    /// level equals its nearest explicit ancestor's level
    #[test]
    fn test_effective_level_is_nearest_explicit(
        ops in prop::collection::vec((logger_name(), prop::option::of(any_level())), 1..40),
        probes in prop::collection::vec(logger_name(), 1..10),
    ) {
        let context = LogContext::new(true);
        for (name, level) in &ops {
            context.logger(name).set_level(*level);
        }
        for name in probes.iter().chain(ops.iter().map(|(n, _)| n)) {
            prop_assert_eq!(
                context.logger(name).effective_level(),
                nearest_explicit(&context, name)
            );
        }
    }

    /// Setting a level never changes loggers outside its subtree or below an
    /// explicitly configured descendant
    #[test]
    fn test_propagation_stops_at_explicit_descendants(
        setup in prop::collection::vec((logger_name(), any_level()), 0..10),
        target in logger_name(),
        level in any_level(),
        probes in prop::collection::vec(logger_name(), 1..10),
    ) {
        let context = LogContext::new(true);
        for (name, l) in &setup {
            context.logger(name).set_level(Some(*l));
        }
        let before: Vec<(String, LogLevel)> = probes
            .iter()
            .map(|n| (n.clone(), context.logger(n).effective_level()))
            .collect();

        context.logger(&target).set_level(Some(level));

        for (name, old) in before {
            let inside = name == target || name.starts_with(&format!("{}.", target));
            let now = context.logger(&name).effective_level();
            if !inside {
                prop_assert_eq!(now, old);
            } else {
                prop_assert_eq!(now, nearest_explicit(&context, &name));
            }
        }
    }

    /// Lookup through any spelling with empty segments reaches the same logger
    #[test]
    fn test_empty_segments_are_ignored(name in logger_name(), level in any_level()) {
        let context = LogContext::new(false);
        let sloppy = format!(".{}.", name.replace('.', ".."));
        context.logger(&sloppy).set_level(Some(level));
        prop_assert_eq!(context.logger(&name).level(), Some(level));
        let sloppy_logger = context.logger(&sloppy);
        prop_assert_eq!(sloppy_logger.name(), name.as_str());
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

proptest! {
    /// An event reaches exactly the handlers from its logger up to the first
    /// logger that stops delegating
    #[test]
    fn test_dispatch_reaches_expected_chain(
        depth in 1usize..5,
        stop_at in prop::option::of(0usize..5),
    ) {
        let context = LogContext::new(true);
        let names: Vec<String> = (0..=depth)
            .map(|d| (0..d).map(|i| format!("n{}", i)).collect::<Vec<_>>().join("."))
            .collect();
        let sinks: Vec<Arc<QueueHandler>> = names
            .iter()
            .map(|name| {
                let sink = Arc::new(QueueHandler::new(4));
                context.logger(name).add_handler(sink.clone());
                sink
            })
            .collect();
        if let Some(stop) = stop_at.filter(|s| *s <= depth) {
            context.logger(&names[stop]).set_use_parent_handlers(false);
        }

        context.logger(&names[depth]).log_event(LogEvent::new(LogLevel::Error, "probe"));

        // names[0] is the root; an event climbs from names[depth] downwards
        let lowest_reached = match stop_at.filter(|s| *s <= depth) {
            Some(stop) => stop,
            None => 0,
        };
        for (d, sink) in sinks.iter().enumerate() {
            let expected = if d >= lowest_reached { 1 } else { 0 };
            prop_assert_eq!(sink.len(), expected, "depth {}", d);
        }
    }
}
