//! Event filters

use super::log_event::LogEvent;
use super::log_level::LogLevel;
use std::sync::Arc;

/// A predicate that can reject an event before any handler runs
///
/// Filters must be side-effect free from the dispatcher's point of view. A
/// filter that panics is treated as accepting the event.
pub trait Filter: Send + Sync {
    fn is_loggable(&self, event: &LogEvent) -> bool;
}

pub type SharedFilter = Arc<dyn Filter>;

impl<F> Filter for F
where
    F: Fn(&LogEvent) -> bool + Send + Sync,
{
    fn is_loggable(&self, event: &LogEvent) -> bool {
        self(event)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Filter for AcceptAll {
    fn is_loggable(&self, _event: &LogEvent) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl Filter for DenyAll {
    fn is_loggable(&self, _event: &LogEvent) -> bool {
        false
    }
}

/// Accepts events whose level lies within `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct LevelRangeFilter {
    min: LogLevel,
    max: LogLevel,
}

impl LevelRangeFilter {
    pub fn new(min: LogLevel, max: LogLevel) -> Self {
        Self { min, max }
    }
}

impl Filter for LevelRangeFilter {
    fn is_loggable(&self, event: &LogEvent) -> bool {
        (self.min..=self.max).contains(&event.level())
    }
}

/// Accepts only when every inner filter accepts
pub struct AllFilter(Vec<SharedFilter>);

impl AllFilter {
    pub fn new(filters: Vec<SharedFilter>) -> Self {
        Self(filters)
    }
}

impl Filter for AllFilter {
    fn is_loggable(&self, event: &LogEvent) -> bool {
        self.0.iter().all(|f| f.is_loggable(event))
    }
}

/// Accepts when any inner filter accepts
pub struct AnyFilter(Vec<SharedFilter>);

impl AnyFilter {
    pub fn new(filters: Vec<SharedFilter>) -> Self {
        Self(filters)
    }
}

impl Filter for AnyFilter {
    fn is_loggable(&self, event: &LogEvent) -> bool {
        self.0.iter().any(|f| f.is_loggable(event))
    }
}

pub struct InvertFilter(SharedFilter);

impl InvertFilter {
    pub fn new(filter: SharedFilter) -> Self {
        Self(filter)
    }
}

impl Filter for InvertFilter {
    fn is_loggable(&self, event: &LogEvent) -> bool {
        !self.0.is_loggable(event)
    }
}
