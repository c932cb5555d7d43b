//! In-memory handler retaining the most recent events

use crate::core::{Handler, HandlerBase, LogEvent, Result, SharedErrorManager};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Keeps the last `limit` accepted events in memory
///
/// Useful for inspection endpoints and tests. Events are materialized when
/// published, so they can be read from any thread later.
pub struct QueueHandler {
    base: HandlerBase,
    limit: usize,
    events: Mutex<VecDeque<LogEvent>>,
}

impl QueueHandler {
    pub fn new(limit: usize) -> Self {
        Self::with_name("queue", limit)
    }

    pub fn with_name(name: impl Into<String>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            base: HandlerBase::new(name),
            limit,
            events: Mutex::new(VecDeque::with_capacity(limit.min(1024))),
        }
    }

    /// Level, filter and error manager of this handler
    pub fn base(&self) -> &HandlerBase {
        &self.base
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot of retained events, oldest first
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Formatted messages of retained events, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.formatted_message().to_string())
            .collect()
    }

    /// Remove and return every retained event
    pub fn drain(&self) -> Vec<LogEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Handler for QueueHandler {
    fn publish(&self, event: &LogEvent) -> Result<()> {
        if self.base.is_closed() || !self.base.is_loggable(event) {
            return Ok(());
        }
        event.materialize();
        let mut events = self.events.lock();
        if events.len() == self.limit {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.base.mark_closed() {
            self.events.lock().clear();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn error_manager(&self) -> SharedErrorManager {
        self.base.error_manager()
    }
}

impl std::fmt::Debug for QueueHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandler")
            .field("name", &self.base.name())
            .field("limit", &self.limit)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_retains_last_events() {
        let handler = QueueHandler::new(2);
        for message in ["one", "two", "three"] {
            handler.publish(&LogEvent::new(LogLevel::Info, message)).unwrap();
        }
        assert_eq!(handler.messages(), vec!["two", "three"]);
    }

    #[test]
    fn test_respects_handler_level() {
        let handler = QueueHandler::new(8);
        handler.base().set_level(LogLevel::Error);
        handler.publish(&LogEvent::new(LogLevel::Warn, "warn")).unwrap();
        handler.publish(&LogEvent::new(LogLevel::Error, "error")).unwrap();
        assert_eq!(handler.messages(), vec!["error"]);
    }

    #[test]
    fn test_close_is_idempotent_and_stops_recording() {
        let handler = QueueHandler::new(8);
        handler.publish(&LogEvent::new(LogLevel::Info, "before")).unwrap();
        handler.close().unwrap();
        handler.close().unwrap();
        handler.publish(&LogEvent::new(LogLevel::Info, "after")).unwrap();
        assert!(handler.is_empty());
    }

    #[test]
    fn test_drain() {
        let handler = QueueHandler::new(8);
        handler.publish(&LogEvent::new(LogLevel::Info, "x")).unwrap();
        assert_eq!(handler.drain().len(), 1);
        assert!(handler.is_empty());
    }
}
