//! Overflow policies for the async handler queue
//!
//! When the queue of an async handler is full, the policy decides whether
//! the producing thread waits for space or the event is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling a full queue
///
/// # Example
///
/// ```
/// use rust_log_manager::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: wait for space
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// // Wait a bounded time, then drop
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Block the producer until space frees or the handler closes
    ///
    /// No accepted event is lost, at the price of backpressure on the
    /// application.
    #[default]
    Block,

    /// Drop the new event and return immediately
    Discard,

    /// Block up to the timeout, then drop
    BlockWithTimeout(Duration),
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::Discard => write!(f, "Discard"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when events are dropped because the queue is full.
/// The parameter is the total count of dropped events so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
