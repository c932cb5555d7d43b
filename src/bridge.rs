//! Bridge from the `log` facade
//!
//! Records emitted through `log::info!` and friends are routed to the logger
//! named after the record's target, with `::` replaced by `.`, so
//! `my_crate::db` lands on `my_crate.db` and inherits its level and handlers.

use crate::core::{CallerInfo, LogContext, LogEvent, LogLevel, Logger, LoggerError, Result};

/// `log::Log` implementation backed by a [`LogContext`]
///
/// Without an explicit context each record resolves against
/// [`LogContext::current`].
pub struct LogBridge {
    context: Option<LogContext>,
}

impl LogBridge {
    pub fn new(context: Option<LogContext>) -> Self {
        Self { context }
    }

    /// Install a bridge as the global `log` logger
    ///
    /// Fails if another `log` implementation is already installed.
    pub fn install(context: Option<LogContext>) -> Result<()> {
        log::set_boxed_logger(Box::new(LogBridge::new(context)))
            .map_err(|e| LoggerError::other(format!("Failed to install log bridge: {}", e)))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    fn logger_for(&self, target: &str) -> Logger {
        let name = target_to_name(target);
        match &self.context {
            Some(context) => context.logger(&name),
            None => LogContext::current().logger(&name),
        }
    }

    fn event_for(record: &log::Record<'_>) -> LogEvent {
        let mut event = LogEvent::new(map_level(record.level()), record.args().to_string());
        match record.file_static() {
            Some(file) => {
                event = event.with_caller(CallerInfo {
                    file,
                    line: record.line().unwrap_or(0),
                    column: 0,
                    module_path: record.module_path_static(),
                });
            }
            None => event.disable_caller_calculation(),
        }
        event
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.logger_for(metadata.target())
            .is_loggable(map_level(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let logger = self.logger_for(record.target());
        if !logger.is_loggable(map_level(record.level())) {
            return;
        }
        logger.log_event(Self::event_for(record));
    }

    fn flush(&self) {}
}

pub fn map_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

fn target_to_name(target: &str) -> String {
    target.replace("::", ".")
}
