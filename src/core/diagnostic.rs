//! Thread-scoped diagnostic context
//!
//! This module provides:
//! - `Mdc`: a per-thread key/value map
//! - `Ndc`: a per-thread stack of context entries
//! - `MdcGuard` / `NdcGuard`: RAII guards for scoped context
//!
//! Both stores are copy-on-write: the thread-local value is an `Arc` that is
//! cloned into an event when it is created, so taking a snapshot never copies
//! the contents. Mutations clone the backing collection only when a snapshot
//! is still alive.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable copy of a thread's MDC
pub type MdcSnapshot = Arc<BTreeMap<String, String>>;

/// Immutable copy of a thread's NDC
pub type NdcSnapshot = Arc<Vec<String>>;

thread_local! {
    static MDC: RefCell<MdcSnapshot> = RefCell::new(Arc::new(BTreeMap::new()));
    static NDC: RefCell<NdcSnapshot> = RefCell::new(Arc::new(Vec::new()));
}

/// Mapped diagnostic context for the current thread
///
/// # Example
///
/// ```
/// use rust_log_manager::Mdc;
///
/// Mdc::put("request_id", "abc-123");
/// assert_eq!(Mdc::get("request_id").as_deref(), Some("abc-123"));
///
/// {
///     let _guard = Mdc::scoped("user", "alice");
///     assert_eq!(Mdc::get("user").as_deref(), Some("alice"));
/// }
/// assert_eq!(Mdc::get("user"), None);
/// # Mdc::clear();
/// ```
pub struct Mdc;

impl Mdc {
    /// Set a key, returning the previous value
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        MDC.with(|mdc| Arc::make_mut(&mut mdc.borrow_mut()).insert(key.into(), value.into()))
    }

    pub fn get(key: &str) -> Option<String> {
        MDC.with(|mdc| mdc.borrow().get(key).cloned())
    }

    /// Remove a key, returning the previous value
    pub fn remove(key: &str) -> Option<String> {
        MDC.with(|mdc| {
            let mut mdc = mdc.borrow_mut();
            if !mdc.contains_key(key) {
                return None;
            }
            Arc::make_mut(&mut mdc).remove(key)
        })
    }

    pub fn clear() {
        MDC.with(|mdc| *mdc.borrow_mut() = Arc::new(BTreeMap::new()));
    }

    /// Snapshot of the current thread's map
    pub fn copy() -> MdcSnapshot {
        MDC.with(|mdc| Arc::clone(&mdc.borrow()))
    }

    /// Set a key for the lifetime of the returned guard
    ///
    /// When the guard drops, the previous value (if any) is restored.
    #[must_use = "the value is removed when the guard is dropped"]
    pub fn scoped(key: impl Into<String>, value: impl Into<String>) -> MdcGuard {
        let key = key.into();
        let previous = Self::put(key.clone(), value);
        MdcGuard { key, previous }
    }
}

/// RAII guard returned by [`Mdc::scoped`]
pub struct MdcGuard {
    key: String,
    previous: Option<String>,
}

impl Drop for MdcGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                Mdc::put(std::mem::take(&mut self.key), previous);
            }
            None => {
                Mdc::remove(&self.key);
            }
        }
    }
}

/// Nested diagnostic context for the current thread
pub struct Ndc;

impl Ndc {
    /// Push an entry, returning the new depth
    pub fn push(entry: impl Into<String>) -> usize {
        NDC.with(|ndc| {
            let mut ndc = ndc.borrow_mut();
            let stack = Arc::make_mut(&mut ndc);
            stack.push(entry.into());
            stack.len()
        })
    }

    pub fn pop() -> Option<String> {
        NDC.with(|ndc| {
            let mut ndc = ndc.borrow_mut();
            if ndc.is_empty() {
                return None;
            }
            Arc::make_mut(&mut ndc).pop()
        })
    }

    pub fn peek() -> Option<String> {
        NDC.with(|ndc| ndc.borrow().last().cloned())
    }

    pub fn depth() -> usize {
        NDC.with(|ndc| ndc.borrow().len())
    }

    /// Drop entries above `depth`
    pub fn trim_to(depth: usize) {
        NDC.with(|ndc| {
            let mut ndc = ndc.borrow_mut();
            if ndc.len() > depth {
                Arc::make_mut(&mut ndc).truncate(depth);
            }
        })
    }

    pub fn clear() {
        NDC.with(|ndc| *ndc.borrow_mut() = Arc::new(Vec::new()));
    }

    /// The whole stack joined with `.`
    pub fn get() -> String {
        NDC.with(|ndc| ndc.borrow().join("."))
    }

    pub fn copy() -> NdcSnapshot {
        NDC.with(|ndc| Arc::clone(&ndc.borrow()))
    }

    /// Push an entry for the lifetime of the returned guard
    #[must_use = "the entry is popped when the guard is dropped"]
    pub fn scoped(entry: impl Into<String>) -> NdcGuard {
        let depth = Self::depth();
        Self::push(entry);
        NdcGuard { depth }
    }
}

/// RAII guard returned by [`Ndc::scoped`]
pub struct NdcGuard {
    depth: usize,
}

impl Drop for NdcGuard {
    fn drop(&mut self) {
        Ndc::trim_to(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdc_put_get_remove() {
        Mdc::clear();
        assert_eq!(Mdc::put("k", "v1"), None);
        assert_eq!(Mdc::put("k", "v2").as_deref(), Some("v1"));
        assert_eq!(Mdc::get("k").as_deref(), Some("v2"));
        assert_eq!(Mdc::remove("k").as_deref(), Some("v2"));
        assert_eq!(Mdc::remove("k"), None);
    }

    #[test]
    fn test_mdc_snapshot_is_isolated() {
        Mdc::clear();
        Mdc::put("a", "1");
        let snapshot = Mdc::copy();
        Mdc::put("a", "2");
        Mdc::put("b", "3");

        assert_eq!(snapshot.get("a").map(String::as_str), Some("1"));
        assert!(!snapshot.contains_key("b"));
        assert_eq!(Mdc::get("a").as_deref(), Some("2"));
        Mdc::clear();
    }

    #[test]
    fn test_mdc_scoped_restores_previous() {
        Mdc::clear();
        Mdc::put("user", "outer");
        {
            let _guard = Mdc::scoped("user", "inner");
            assert_eq!(Mdc::get("user").as_deref(), Some("inner"));
        }
        assert_eq!(Mdc::get("user").as_deref(), Some("outer"));
        Mdc::clear();
    }

    #[test]
    fn test_mdc_is_thread_local() {
        Mdc::clear();
        Mdc::put("thread", "main");
        let seen = std::thread::spawn(|| Mdc::get("thread")).join().unwrap();
        assert_eq!(seen, None);
        Mdc::clear();
    }

    #[test]
    fn test_ndc_stack() {
        Ndc::clear();
        assert_eq!(Ndc::push("a"), 1);
        assert_eq!(Ndc::push("b"), 2);
        assert_eq!(Ndc::get(), "a.b");
        assert_eq!(Ndc::peek().as_deref(), Some("b"));
        assert_eq!(Ndc::pop().as_deref(), Some("b"));
        assert_eq!(Ndc::depth(), 1);
        Ndc::clear();
        assert_eq!(Ndc::pop(), None);
    }

    #[test]
    fn test_ndc_scoped_trims() {
        Ndc::clear();
        Ndc::push("base");
        {
            let _guard = Ndc::scoped("request");
            Ndc::push("leaked");
            assert_eq!(Ndc::depth(), 3);
        }
        assert_eq!(Ndc::get(), "base");
        Ndc::clear();
    }
}
