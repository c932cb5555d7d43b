//! Handler trait for event sinks

use super::error::{LoggerError, Result};
use super::error_manager::{default_error_manager, ErrorCode, SharedErrorManager};
use super::filter::SharedFilter;
use super::log_event::LogEvent;
use super::log_level::LogLevel;
use arc_swap::{ArcSwap, ArcSwapOption};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// A sink that consumes accepted events.
///
/// Handlers are shared between loggers and threads, so every method takes
/// `&self`. `close` must be idempotent: a second call is a no-op.
pub trait Handler: Send + Sync {
    fn publish(&self, event: &LogEvent) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
    fn name(&self) -> &str;

    /// Channel that receives this handler's failures
    fn error_manager(&self) -> SharedErrorManager {
        default_error_manager()
    }
}

pub type SharedHandler = Arc<dyn Handler>;

/// Run `f`, converting a panic into [`LoggerError::Panicked`]
pub(crate) fn guarded<T>(component: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(LoggerError::from_panic(component, payload.as_ref())),
    }
}

/// Publish to one handler, reporting any failure to its error manager
///
/// Returns whether the handler accepted the event without error.
pub(crate) fn publish_reporting(handler: &dyn Handler, event: &LogEvent) -> bool {
    match guarded(handler.name(), || handler.publish(event)) {
        Ok(()) => true,
        Err(e) => {
            handler.error_manager().error(
                &format!("Handler '{}' failed to publish", handler.name()),
                Some(&e),
                ErrorCode::WriteFailure,
            );
            false
        }
    }
}

/// State shared by handler implementations: threshold, filter, error channel
/// and the closed flag.
pub struct HandlerBase {
    name: String,
    level: AtomicU8,
    filter: ArcSwapOption<SharedFilter>,
    error_manager: ArcSwap<SharedErrorManager>,
    closed: AtomicBool,
}

impl HandlerBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(LogLevel::Trace.as_u8()),
            filter: ArcSwapOption::empty(),
            error_manager: ArcSwap::from_pointee(default_error_manager()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Release);
    }

    pub fn filter(&self) -> Option<SharedFilter> {
        self.filter.load_full().map(|f| Arc::clone(&*f))
    }

    pub fn set_filter(&self, filter: Option<SharedFilter>) {
        self.filter.store(filter.map(Arc::new));
    }

    pub fn error_manager(&self) -> SharedErrorManager {
        Arc::clone(&**self.error_manager.load())
    }

    pub fn set_error_manager(&self, manager: SharedErrorManager) {
        self.error_manager.store(Arc::new(manager));
    }

    /// Level and filter check for this handler
    ///
    /// A panicking filter is reported and the event accepted.
    pub fn is_loggable(&self, event: &LogEvent) -> bool {
        if !event.level().passes(self.level()) {
            return false;
        }
        match &*self.filter.load() {
            None => true,
            Some(filter) => match guarded("filter", || Ok(filter.is_loggable(event))) {
                Ok(accepted) => accepted,
                Err(e) => {
                    self.report("Handler filter failed", Some(&e), ErrorCode::FilterFailure);
                    true
                }
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark closed; returns `true` only for the call that performed the transition
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub fn report(&self, message: &str, error: Option<&LoggerError>, code: ErrorCode) {
        self.error_manager().error(message, error, code);
    }
}
