//! Nodes of the logger naming tree
//!
//! A node owns the configuration for one dotted name: explicit and effective
//! level, handler chain, filter, parent delegation flag and resource bundle.
//! Parents own their children; a child only keeps a weak back-reference.
//!
//! Reads (effective level, handlers, children) are lock-free loads of
//! published values. Every level change and child creation happens while the
//! tree lock is held, proven by a [`TreeGuard`] argument.

use super::filter::SharedFilter;
use super::handler::SharedHandler;
use super::log_level::LogLevel;
use super::logger::LoggerInner;
use super::resource_bundle::ResourceBundle;
use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

/// Effective level of the root when it has no explicit level
pub const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Info;

/// Encoded "no explicit level"
const INHERIT: u8 = u8::MAX;

pub const SEPARATOR: char = '.';

type ChildMap = HashMap<Arc<str>, Arc<LoggerNode>>;

/// Proof that the tree-wide lock is held
pub(crate) struct TreeGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl<'a> TreeGuard<'a> {
    pub(crate) fn new(guard: MutexGuard<'a, ()>) -> Self {
        Self { _guard: guard }
    }
}

pub(crate) struct LoggerNode {
    name: Arc<str>,
    parent: Weak<LoggerNode>,
    explicit_level: AtomicU8,
    effective_level: AtomicU8,
    handlers: ArcSwap<Vec<SharedHandler>>,
    filter: ArcSwapOption<SharedFilter>,
    use_parent_handlers: AtomicBool,
    resource_bundle: ArcSwapOption<Arc<dyn ResourceBundle>>,
    children: ArcSwap<ChildMap>,
    handle: Mutex<Weak<LoggerInner>>,
}

impl LoggerNode {
    pub(crate) fn new_root() -> Arc<Self> {
        Arc::new(Self::with_parent(Arc::from(""), Weak::new(), DEFAULT_ROOT_LEVEL))
    }

    fn with_parent(name: Arc<str>, parent: Weak<LoggerNode>, effective: LogLevel) -> Self {
        Self {
            name,
            parent,
            explicit_level: AtomicU8::new(INHERIT),
            effective_level: AtomicU8::new(effective.as_u8()),
            handlers: ArcSwap::from_pointee(Vec::new()),
            filter: ArcSwapOption::empty(),
            use_parent_handlers: AtomicBool::new(true),
            resource_bundle: ArcSwapOption::empty(),
            children: ArcSwap::from_pointee(HashMap::new()),
            handle: Mutex::new(Weak::new()),
        }
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    pub(crate) fn parent(&self) -> Option<Arc<LoggerNode>> {
        self.parent.upgrade()
    }

    /// Lock-free child lookup
    pub(crate) fn child(&self, segment: &str) -> Option<Arc<LoggerNode>> {
        self.children.load().get(segment).cloned()
    }

    pub(crate) fn children(&self) -> Vec<Arc<LoggerNode>> {
        self.children.load().values().cloned().collect()
    }

    /// Find or create the child for `segment`
    ///
    /// Creation is serialized by the tree lock, so concurrent callers all
    /// observe the same winning node. A new child starts with this node's
    /// current effective level.
    pub(crate) fn get_or_create_child(
        self: &Arc<Self>,
        segment: &str,
        _guard: &TreeGuard<'_>,
    ) -> Arc<LoggerNode> {
        if let Some(existing) = self.child(segment) {
            return existing;
        }
        let name: Arc<str> = if self.is_root() {
            Arc::from(segment)
        } else {
            Arc::from(format!("{}{}{}", self.name, SEPARATOR, segment))
        };
        let child = Arc::new(Self::with_parent(
            name,
            Arc::downgrade(self),
            self.effective_level(),
        ));
        let mut next = ChildMap::clone(&self.children.load());
        next.insert(Arc::from(segment), Arc::clone(&child));
        self.children.store(Arc::new(next));
        child
    }

    pub(crate) fn explicit_level(&self) -> Option<LogLevel> {
        LogLevel::from_u8(self.explicit_level.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn effective_level(&self) -> LogLevel {
        LogLevel::from_u8(self.effective_level.load(Ordering::Acquire))
            .unwrap_or(DEFAULT_ROOT_LEVEL)
    }

    #[inline]
    pub(crate) fn is_loggable(&self, level: LogLevel) -> bool {
        level.passes(self.effective_level())
    }

    /// Set or clear the explicit level and re-establish inheritance below
    ///
    /// When the effective level changes, every descendant reachable through
    /// inheriting nodes is updated before the lock is released. A descendant
    /// with an explicit level stops the walk down its branch.
    pub(crate) fn set_level(&self, level: Option<LogLevel>, _guard: &TreeGuard<'_>) {
        self.explicit_level
            .store(level.map_or(INHERIT, LogLevel::as_u8), Ordering::Release);
        let effective = match level {
            Some(level) => level,
            None => self
                .parent()
                .map_or(DEFAULT_ROOT_LEVEL, |parent| parent.effective_level()),
        };
        let previous = self
            .effective_level
            .swap(effective.as_u8(), Ordering::AcqRel);
        if previous != effective.as_u8() {
            self.propagate(effective);
        }
    }

    fn propagate(&self, effective: LogLevel) {
        let mut pending = self.children();
        while let Some(child) = pending.pop() {
            if child.explicit_level().is_some() {
                continue;
            }
            child
                .effective_level
                .store(effective.as_u8(), Ordering::Release);
            pending.extend(child.children.load().values().cloned());
        }
    }

    pub(crate) fn handlers(&self) -> Arc<Vec<SharedHandler>> {
        self.handlers.load_full()
    }

    pub(crate) fn add_handler(&self, handler: SharedHandler) {
        self.handlers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&handler));
            next
        });
    }

    /// Remove every occurrence of `handler`; returns whether one was present
    pub(crate) fn remove_handler(&self, handler: &SharedHandler) -> bool {
        let previous = self.handlers.rcu(|current| {
            current
                .iter()
                .filter(|h| !same_handler(h, handler))
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|h| same_handler(h, handler))
    }

    pub(crate) fn set_handlers(&self, handlers: Vec<SharedHandler>) -> Arc<Vec<SharedHandler>> {
        self.handlers.swap(Arc::new(handlers))
    }

    pub(crate) fn compare_and_set_handlers(
        &self,
        expected: &Arc<Vec<SharedHandler>>,
        handlers: Vec<SharedHandler>,
    ) -> bool {
        let previous = self.handlers.compare_and_swap(expected, Arc::new(handlers));
        Arc::ptr_eq(&*previous, expected)
    }

    pub(crate) fn filter(&self) -> Option<SharedFilter> {
        self.filter.load_full().map(|f| Arc::clone(&*f))
    }

    pub(crate) fn set_filter(&self, filter: Option<SharedFilter>) {
        self.filter.store(filter.map(Arc::new));
    }

    pub(crate) fn use_parent_handlers(&self) -> bool {
        self.use_parent_handlers.load(Ordering::Acquire)
    }

    pub(crate) fn set_use_parent_handlers(&self, value: bool) {
        self.use_parent_handlers.store(value, Ordering::Release);
    }

    pub(crate) fn resource_bundle(&self) -> Option<Arc<dyn ResourceBundle>> {
        self.resource_bundle.load_full().map(|b| Arc::clone(&*b))
    }

    pub(crate) fn set_resource_bundle(&self, bundle: Option<Arc<dyn ResourceBundle>>) {
        self.resource_bundle.store(bundle.map(Arc::new));
    }

    /// Slot holding this node's (weak) logger handle
    pub(crate) fn handle_slot(&self) -> &Mutex<Weak<LoggerInner>> {
        &self.handle
    }

    pub(crate) fn has_live_handle(&self) -> bool {
        self.handle.lock().strong_count() > 0
    }
}

/// Identity comparison that ignores vtable addresses
pub(crate) fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
