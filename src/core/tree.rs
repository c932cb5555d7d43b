//! The logger naming tree of one context

use super::error_manager::{default_error_manager, SharedErrorManager};
use super::log_level::LogLevel;
use super::logger::{Logger, LoggerInner};
use super::node::{LoggerNode, TreeGuard, SEPARATOR};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) struct LoggerTree {
    root: Arc<LoggerNode>,
    /// Serializes level changes and child creation across the whole tree
    lock: Mutex<()>,
    strong_handles: bool,
    /// Handles retained strongly; `None` once the owning context is gone
    pinned: Mutex<Option<Vec<Arc<LoggerInner>>>>,
    error_manager: ArcSwap<SharedErrorManager>,
}

impl LoggerTree {
    pub(crate) fn new(strong_handles: bool) -> Arc<Self> {
        Arc::new(Self {
            root: LoggerNode::new_root(),
            lock: Mutex::new(()),
            strong_handles,
            pinned: Mutex::new(Some(Vec::new())),
            error_manager: ArcSwap::from_pointee(default_error_manager()),
        })
    }

    pub(crate) fn root(&self) -> &Arc<LoggerNode> {
        &self.root
    }

    pub(crate) fn lock(&self) -> TreeGuard<'_> {
        TreeGuard::new(self.lock.lock())
    }

    /// Walk `name` segment by segment, creating missing nodes
    ///
    /// Existing segments are found without locking. The first missing segment
    /// takes the tree lock and the rest of the path is created under it.
    pub(crate) fn resolve(&self, name: &str) -> Arc<LoggerNode> {
        let mut node = Arc::clone(&self.root);
        let mut segments = name.split(SEPARATOR).filter(|s| !s.is_empty());
        while let Some(segment) = segments.next() {
            if let Some(child) = node.child(segment) {
                node = child;
                continue;
            }
            let guard = self.lock();
            node = node.get_or_create_child(segment, &guard);
            for segment in segments.by_ref() {
                node = node.get_or_create_child(segment, &guard);
            }
        }
        node
    }

    /// Lookup without creating anything
    pub(crate) fn find(&self, name: &str) -> Option<Arc<LoggerNode>> {
        name.split(SEPARATOR)
            .filter(|s| !s.is_empty())
            .try_fold(Arc::clone(&self.root), |node, segment| node.child(segment))
    }

    /// Every node in the tree, root first
    pub(crate) fn nodes(&self) -> Vec<Arc<LoggerNode>> {
        let mut out = Vec::new();
        let mut pending = vec![Arc::clone(&self.root)];
        while let Some(node) = pending.pop() {
            pending.extend(node.children());
            out.push(node);
        }
        out
    }

    /// Return the live handle for `node`, creating one if it was reclaimed
    pub(crate) fn handle_for(self: &Arc<Self>, node: &Arc<LoggerNode>) -> Logger {
        let mut slot = node.handle_slot().lock();
        if let Some(inner) = slot.upgrade() {
            return Logger::from_inner(inner);
        }
        let inner = Arc::new(LoggerInner::new(Arc::clone(node), Arc::clone(self)));
        *slot = Arc::downgrade(&inner);
        if self.strong_handles || node.is_root() {
            if let Some(pins) = self.pinned.lock().as_mut() {
                pins.push(Arc::clone(&inner));
            }
        }
        Logger::from_inner(inner)
    }

    pub(crate) fn set_level(&self, node: &LoggerNode, level: Option<LogLevel>) {
        let guard = self.lock();
        node.set_level(level, &guard);
    }

    /// Apply several level changes under one acquisition of the tree lock
    pub(crate) fn set_levels(&self, changes: &[(Arc<LoggerNode>, Option<LogLevel>)]) {
        let guard = self.lock();
        for (node, level) in changes {
            node.set_level(*level, &guard);
        }
    }

    /// Drop strong handle references so the tree can be freed
    pub(crate) fn release_pins(&self) {
        let pins = self.pinned.lock().take();
        drop(pins);
    }

    pub(crate) fn error_manager(&self) -> SharedErrorManager {
        Arc::clone(&**self.error_manager.load())
    }

    pub(crate) fn set_error_manager(&self, manager: SharedErrorManager) {
        self.error_manager.store(Arc::new(manager));
    }
}
