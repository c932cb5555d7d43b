//! Log contexts and the process-wide default
//!
//! A [`LogContext`] owns one logger naming tree. Most applications use the
//! process-wide [`LogContext::system`] context through [`Logger::get`]; which
//! context `Logger::get` resolves against is decided by the installed
//! [`LogContextSelector`], so tests and embedders can swap it without touching
//! the system context itself.

use super::config::LevelConfig;
use super::error::Result;
use super::error_manager::SharedErrorManager;
use super::log_level::LogLevel;
use super::logger::Logger;
use super::tree::LoggerTree;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

/// Chooses the context that `Logger::get` and `LogContext::current` use
pub trait LogContextSelector: Send + Sync {
    fn context(&self) -> LogContext;
}

/// Always returns the same context
pub struct StaticContextSelector {
    context: LogContext,
}

impl StaticContextSelector {
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }
}

impl LogContextSelector for StaticContextSelector {
    fn context(&self) -> LogContext {
        self.context.clone()
    }
}

struct ContextInner {
    tree: Arc<LoggerTree>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        // pinned handles point back at the tree
        self.tree.release_pins();
    }
}

/// A registry of loggers sharing one naming tree
#[derive(Clone)]
pub struct LogContext {
    inner: Arc<ContextInner>,
}

impl LogContext {
    /// Create an independent context
    ///
    /// With `strong_handles`, every logger handed out stays alive for as long
    /// as the context does. Otherwise only the root handle is retained and
    /// other handles are reclaimed once the application drops them; their
    /// configuration stays in the tree.
    pub fn new(strong_handles: bool) -> Self {
        let tree = LoggerTree::new(strong_handles);
        let root = Arc::clone(tree.root());
        drop(tree.handle_for(&root));
        Self {
            inner: Arc::new(ContextInner { tree }),
        }
    }

    /// The process-wide default context
    pub fn system() -> LogContext {
        static SYSTEM: OnceLock<LogContext> = OnceLock::new();
        SYSTEM.get_or_init(|| LogContext::new(false)).clone()
    }

    /// The context chosen by the installed selector
    pub fn current() -> LogContext {
        selector().read().context()
    }

    /// Install a selector, returning the previous one
    pub fn set_selector(
        selector_impl: Arc<dyn LogContextSelector>,
    ) -> Arc<dyn LogContextSelector> {
        std::mem::replace(&mut *selector().write(), selector_impl)
    }

    /// Find or create the logger for `name`; `""` is the root
    pub fn logger(&self, name: &str) -> Logger {
        let node = self.inner.tree.resolve(name);
        self.inner.tree.handle_for(&node)
    }

    /// The logger for `name` if its node exists, without creating one
    pub fn logger_if_exists(&self, name: &str) -> Option<Logger> {
        self.inner
            .tree
            .find(name)
            .map(|node| self.inner.tree.handle_for(&node))
    }

    pub fn root_logger(&self) -> Logger {
        self.logger("")
    }

    /// Names of loggers that currently have a live handle
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .tree
            .nodes()
            .into_iter()
            .filter(|node| node.has_live_handle())
            .map(|node| node.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Apply every level in `config` atomically
    ///
    /// All level names are parsed first; on an invalid name nothing changes.
    pub fn apply_levels(&self, config: &LevelConfig) -> Result<()> {
        let parsed = config.parse()?;
        let changes: Vec<_> = parsed
            .into_iter()
            .map(|(name, level)| (self.inner.tree.resolve(&name), level))
            .collect();
        self.inner.tree.set_levels(&changes);
        Ok(())
    }

    pub fn set_level(&self, name: &str, level: Option<LogLevel>) {
        let node = self.inner.tree.resolve(name);
        self.inner.tree.set_level(&node, level);
    }

    /// Channel for filter failures raised during dispatch
    pub fn error_manager(&self) -> SharedErrorManager {
        self.inner.tree.error_manager()
    }

    pub fn set_error_manager(&self, manager: SharedErrorManager) {
        self.inner.tree.set_error_manager(manager);
    }

    pub fn ptr_eq(&self, other: &LogContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(false)
    }
}

fn selector() -> &'static RwLock<Arc<dyn LogContextSelector>> {
    static SELECTOR: OnceLock<RwLock<Arc<dyn LogContextSelector>>> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        RwLock::new(Arc::new(StaticContextSelector::new(LogContext::system())))
    })
}
