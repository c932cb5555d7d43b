//! Error channels for handler and filter failures
//!
//! Logging never returns handler failures to application code. Instead the
//! failure is routed to an [`ErrorManager`], which by default writes one line
//! to stderr.

use super::error::LoggerError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Category of a reported failure
///
/// `Generic` and `OpenFailure` are never reported by this crate itself; they
/// exist for sinks that open external resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Generic,
    WriteFailure,
    FlushFailure,
    CloseFailure,
    OpenFailure,
    FilterFailure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Generic => "generic",
            ErrorCode::WriteFailure => "write",
            ErrorCode::FlushFailure => "flush",
            ErrorCode::CloseFailure => "close",
            ErrorCode::OpenFailure => "open",
            ErrorCode::FilterFailure => "filter",
        };
        f.write_str(s)
    }
}

pub trait ErrorManager: Send + Sync {
    fn error(&self, message: &str, error: Option<&LoggerError>, code: ErrorCode);
}

pub type SharedErrorManager = Arc<dyn ErrorManager>;

/// Writes every report to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrErrorManager;

impl ErrorManager for StderrErrorManager {
    fn error(&self, message: &str, error: Option<&LoggerError>, code: ErrorCode) {
        match error {
            Some(LoggerError::Panicked { .. }) => {
                eprintln!("[LOGGER CRITICAL] {} ({}): {}", message, code, error_text(error))
            }
            _ => eprintln!("[LOGGER ERROR] {} ({}): {}", message, code, error_text(error)),
        }
    }
}

/// Forwards only the first report to the wrapped manager
pub struct OnlyOnceErrorManager {
    reported: AtomicBool,
    inner: SharedErrorManager,
}

impl OnlyOnceErrorManager {
    pub fn new() -> Self {
        Self::wrapping(Arc::new(StderrErrorManager))
    }

    pub fn wrapping(inner: SharedErrorManager) -> Self {
        Self {
            reported: AtomicBool::new(false),
            inner,
        }
    }
}

impl Default for OnlyOnceErrorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorManager for OnlyOnceErrorManager {
    fn error(&self, message: &str, error: Option<&LoggerError>, code: ErrorCode) {
        if self.reported.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.error(message, error, code);
    }
}

fn error_text(error: Option<&LoggerError>) -> String {
    error.map(ToString::to_string).unwrap_or_else(|| "no details".to_string())
}

/// The process-wide stderr manager handed out as a default
pub fn default_error_manager() -> SharedErrorManager {
    static DEFAULT: std::sync::OnceLock<SharedErrorManager> = std::sync::OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(StderrErrorManager)))
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingErrorManager;
    use super::*;

    #[test]
    fn test_only_once_forwards_first_report() {
        let recorder = Arc::new(RecordingErrorManager::default());
        let manager = OnlyOnceErrorManager::wrapping(recorder.clone());

        manager.error("first", None, ErrorCode::WriteFailure);
        manager.error("second", None, ErrorCode::FlushFailure);

        let reports = recorder.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0], ("first".to_string(), ErrorCode::WriteFailure));
    }

    #[test]
    fn test_default_manager_is_shared() {
        let a = default_error_manager();
        let b = default_error_manager();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FilterFailure.to_string(), "filter");
        assert_eq!(ErrorCode::CloseFailure.to_string(), "close");
    }
}
