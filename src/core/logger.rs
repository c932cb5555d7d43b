//! Logger handles

use super::context::LogContext;
use super::dispatch;
use super::error::Result;
use super::field_value::FieldValue;
use super::filter::SharedFilter;
use super::handler::SharedHandler;
use super::log_event::{FormatStyle, LogEvent, SharedError};
use super::log_level::LogLevel;
use super::node::LoggerNode;
use super::resource_bundle::ResourceBundle;
use super::tree::LoggerTree;
use std::fmt;
use std::sync::Arc;

pub(crate) struct LoggerInner {
    node: Arc<LoggerNode>,
    tree: Arc<LoggerTree>,
}

impl LoggerInner {
    pub(crate) fn new(node: Arc<LoggerNode>, tree: Arc<LoggerTree>) -> Self {
        Self { node, tree }
    }
}

/// Named handle through which application code emits events.
///
/// A `Logger` is a cheap, clonable view of one node of its context's tree.
/// Configuration lives in the node, not the handle: dropping every handle for
/// a name loses nothing, and the next lookup hands out a fresh handle that
/// sees the same level and handlers.
///
/// # Example
///
/// ```
/// use rust_log_manager::prelude::*;
///
/// let context = LogContext::new(false);
/// let logger = context.logger("app.db");
/// logger.set_level(Some(LogLevel::Debug));
///
/// assert!(logger.is_loggable(LogLevel::Debug));
/// assert!(!context.logger("app").is_loggable(LogLevel::Debug));
/// logger.debug("connected");
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub(crate) fn from_inner(inner: Arc<LoggerInner>) -> Self {
        Self { inner }
    }

    /// Look up `name` in the current context
    pub fn get(name: &str) -> Logger {
        LogContext::current().logger(name)
    }

    /// Fully qualified name; the root logger's name is empty
    pub fn name(&self) -> &str {
        self.inner.node.name()
    }

    pub fn parent(&self) -> Option<Logger> {
        self.inner
            .node
            .parent()
            .map(|parent| self.inner.tree.handle_for(&parent))
    }

    /// Explicit level, `None` when inherited
    pub fn level(&self) -> Option<LogLevel> {
        self.inner.node.explicit_level()
    }

    pub fn effective_level(&self) -> LogLevel {
        self.inner.node.effective_level()
    }

    /// Set (or with `None`, clear) the explicit level
    ///
    /// Inheriting descendants observe the new effective level as soon as this
    /// call returns.
    pub fn set_level(&self, level: Option<LogLevel>) {
        self.inner.tree.set_level(&self.inner.node, level);
    }

    /// Set the level from its name; `""` or `"INHERIT"` clears it
    pub fn set_level_str(&self, level: &str) -> Result<()> {
        let level = super::config::parse_level_setting(level)?;
        self.set_level(level);
        Ok(())
    }

    /// Lock-free threshold check
    #[inline]
    pub fn is_loggable(&self, level: LogLevel) -> bool {
        self.inner.node.is_loggable(level)
    }

    pub fn filter(&self) -> Option<SharedFilter> {
        self.inner.node.filter()
    }

    pub fn set_filter(&self, filter: Option<SharedFilter>) {
        self.inner.node.set_filter(filter);
    }

    pub fn use_parent_handlers(&self) -> bool {
        self.inner.node.use_parent_handlers()
    }

    pub fn set_use_parent_handlers(&self, value: bool) {
        self.inner.node.set_use_parent_handlers(value);
    }

    pub fn handlers(&self) -> Arc<Vec<SharedHandler>> {
        self.inner.node.handlers()
    }

    pub fn add_handler(&self, handler: SharedHandler) {
        self.inner.node.add_handler(handler);
    }

    pub fn remove_handler(&self, handler: &SharedHandler) -> bool {
        self.inner.node.remove_handler(handler)
    }

    /// Replace the chain, returning the previous one
    pub fn set_handlers(&self, handlers: Vec<SharedHandler>) -> Arc<Vec<SharedHandler>> {
        self.inner.node.set_handlers(handlers)
    }

    pub fn clear_handlers(&self) -> Arc<Vec<SharedHandler>> {
        self.inner.node.set_handlers(Vec::new())
    }

    /// Replace the chain only if it is still `expected`
    pub fn compare_and_set_handlers(
        &self,
        expected: &Arc<Vec<SharedHandler>>,
        handlers: Vec<SharedHandler>,
    ) -> bool {
        self.inner.node.compare_and_set_handlers(expected, handlers)
    }

    pub fn resource_bundle(&self) -> Option<Arc<dyn ResourceBundle>> {
        self.inner.node.resource_bundle()
    }

    pub fn set_resource_bundle(&self, bundle: Option<Arc<dyn ResourceBundle>>) {
        self.inner.node.set_resource_bundle(bundle);
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_loggable(level) {
            return;
        }
        self.log_event(LogEvent::new(level, message));
    }

    #[track_caller]
    pub fn log_params<I, V>(&self, level: LogLevel, style: FormatStyle, message: &str, params: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        if !self.is_loggable(level) {
            return;
        }
        self.log_event(LogEvent::new(level, message).with_params(style, params));
    }

    #[track_caller]
    pub fn log_error(&self, level: LogLevel, message: impl Into<String>, error: SharedError) {
        if !self.is_loggable(level) {
            return;
        }
        self.log_event(LogEvent::new(level, message).with_error(error));
    }

    /// Dispatch a prepared event through this logger
    ///
    /// The event is rejected if its level does not pass this logger's
    /// effective level.
    pub fn log_event(&self, mut event: LogEvent) {
        if !self.is_loggable(event.level()) {
            return;
        }
        event.set_logger_name(Arc::clone(self.inner.node.name()));
        let errors = self.inner.tree.error_manager();
        dispatch::dispatch(&self.inner.node, event, errors.as_ref());
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn __log_from_macro(&self, level: LogLevel, message: String, module_path: &'static str) {
        self.log_event(LogEvent::new(level, message).with_module_path(module_path));
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("effective_level", &self.effective_level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::error_manager::testing::RecordingErrorManager;
    use crate::core::error_manager::ErrorCode;
    use crate::core::handler::Handler;
    use crate::core::resource_bundle::MapBundle;
    use crate::handlers::QueueHandler;

    fn recorder() -> Arc<QueueHandler> {
        Arc::new(QueueHandler::new(64))
    }

    struct FailingHandler;

    impl Handler for FailingHandler {
        fn publish(&self, _event: &LogEvent) -> Result<()> {
            Err(LoggerError::other("Simulated failure"))
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn close(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_level_check_skips_dispatch() {
        let context = LogContext::new(false);
        let logger = context.logger("quiet");
        let sink = recorder();
        logger.add_handler(sink.clone());
        logger.set_level(Some(LogLevel::Warn));

        logger.info("dropped");
        logger.warn("kept");

        assert_eq!(sink.messages(), vec!["kept"]);
        assert_eq!(sink.events()[0].logger_name(), "quiet");
    }

    #[test]
    fn test_dispatch_walks_ancestors_in_order() {
        let context = LogContext::new(false);
        let order = recorder();
        context.root_logger().add_handler(order.clone());
        context.logger("a").add_handler(order.clone());
        context.logger("a.b").add_handler(order.clone());

        context.logger("a.b").info("walk");

        let events = order.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.logger_name() == "a.b"));
    }

    #[test]
    fn test_delegation_disabled_stops_walk() {
        let context = LogContext::new(false);
        let a = recorder();
        let b = recorder();
        let c = recorder();
        context.logger("a").add_handler(a.clone());
        context.logger("a.b").add_handler(b.clone());
        context.logger("a.b").set_use_parent_handlers(false);
        context.logger("a.b.c").add_handler(c.clone());

        context.logger("a.b.c").info("stop at b");

        assert_eq!(c.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn test_filter_rejection_short_circuits() {
        let context = LogContext::new(false);
        let root = recorder();
        let leaf = recorder();
        context.root_logger().add_handler(root.clone());
        let logger = context.logger("filtered");
        logger.add_handler(leaf.clone());
        logger.set_filter(Some(Arc::new(|e: &LogEvent| !e.message().contains("secret"))));

        logger.info("secret token");
        logger.info("public");

        assert_eq!(leaf.messages(), vec!["public"]);
        assert_eq!(root.messages(), vec!["public"]);
    }

    #[test]
    fn test_panicking_filter_fails_open_and_reports() {
        let context = LogContext::new(false);
        let errors = Arc::new(RecordingErrorManager::default());
        context.set_error_manager(errors.clone());
        let logger = context.logger("buggy");
        let sink = recorder();
        logger.add_handler(sink.clone());
        logger.set_filter(Some(Arc::new(|_: &LogEvent| -> bool { panic!("filter bug") })));

        logger.info("still delivered");

        assert_eq!(sink.len(), 1);
        assert_eq!(errors.reports.lock()[0].1, ErrorCode::FilterFailure);
    }

    #[test]
    fn test_failing_handler_does_not_affect_siblings() {
        let context = LogContext::new(false);
        let logger = context.logger("mixed");
        let after = recorder();
        logger.add_handler(Arc::new(FailingHandler));
        logger.add_handler(after.clone());

        logger.error("survives");

        assert_eq!(after.messages(), vec!["survives"]);
    }

    #[test]
    fn test_handler_chain_mutation() {
        let context = LogContext::new(false);
        let logger = context.logger("chain");
        let first: SharedHandler = recorder();
        let second: SharedHandler = recorder();

        logger.add_handler(Arc::clone(&first));
        logger.add_handler(Arc::clone(&second));
        assert_eq!(logger.handlers().len(), 2);

        assert!(logger.remove_handler(&first));
        assert!(!logger.remove_handler(&first));
        assert_eq!(logger.handlers().len(), 1);

        let snapshot = logger.handlers();
        assert!(logger.compare_and_set_handlers(&snapshot, vec![Arc::clone(&first)]));
        assert!(!logger.compare_and_set_handlers(&snapshot, Vec::new()));

        let previous = logger.clear_handlers();
        assert_eq!(previous.len(), 1);
        assert!(logger.handlers().is_empty());
    }

    #[test]
    fn test_nearest_bundle_is_attached() {
        let context = LogContext::new(false);
        let sink = recorder();
        let parent = context.logger("i18n");
        parent.set_resource_bundle(Some(Arc::new(
            MapBundle::new("messages").with_entry("start", "Started {0}"),
        )));
        let child = context.logger("i18n.worker");
        child.add_handler(sink.clone());

        child.log_params(LogLevel::Info, FormatStyle::Positional, "start", ["pool"]);

        let events = sink.events();
        assert_eq!(events[0].formatted_message(), "Started pool");
        assert_eq!(events[0].resource_bundle().unwrap().name(), "messages");
    }

    #[test]
    fn test_log_error_carries_error() {
        let context = LogContext::new(false);
        let logger = context.logger("errors");
        let sink = recorder();
        logger.add_handler(sink.clone());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        logger.log_error(LogLevel::Error, "write failed", Arc::new(io));

        let events = sink.events();
        assert_eq!(events[0].thrown().unwrap().to_string(), "disk gone");
    }

    #[test]
    fn test_caller_points_at_emit_site() {
        let context = LogContext::new(false);
        let logger = context.logger("caller");
        let sink = recorder();
        logger.add_handler(sink.clone());

        let line = line!() + 1;
        logger.info("where");

        let events = sink.events();
        let caller = events[0].caller().unwrap();
        assert_eq!(caller.line, line);
        assert!(caller.file.ends_with("logger.rs"));
    }

    #[test]
    fn test_set_level_str_rejects_unknown() {
        let context = LogContext::new(false);
        let logger = context.logger("parse");
        assert!(logger.set_level_str("loud").is_err());
        assert_eq!(logger.level(), None);
        logger.set_level_str("debug").unwrap();
        assert_eq!(logger.level(), Some(LogLevel::Debug));
        logger.set_level_str("inherit").unwrap();
        assert_eq!(logger.level(), None);
    }

    #[test]
    fn test_parent_handle() {
        let context = LogContext::new(false);
        let logger = context.logger("p.q");
        assert_eq!(logger.parent().unwrap().name(), "p");
        assert_eq!(logger.parent().unwrap().parent().unwrap().name(), "");
        assert!(context.root_logger().parent().is_none());
    }
}
