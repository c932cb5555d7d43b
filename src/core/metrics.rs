//! Async handler metrics for observability
//!
//! Provides counters for monitoring queue health, including dropped event
//! counts, queue-full events and target failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one async handler queue
///
/// # Example
///
/// ```
/// use rust_log_manager::QueueMetrics;
///
/// let metrics = QueueMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct QueueMetrics {
    /// Events accepted into the queue
    enqueued: AtomicU64,

    /// Events taken off the queue and handed to the targets
    forwarded: AtomicU64,

    /// Events dropped because the queue was full
    dropped_count: AtomicU64,

    /// Number of times the queue was found full
    queue_full_events: AtomicU64,

    /// Number of times a producer had to wait for space
    block_events: AtomicU64,

    /// Target publish calls that failed or panicked
    target_failures: AtomicU64,
}

impl QueueMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            target_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn target_failures(&self) -> u64 {
        self.target_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a dropped event, returning the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_target_failure(&self) -> u64 {
        self.target_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been offered to the queue.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueueMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            forwarded: AtomicU64::new(self.forwarded()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            target_failures: AtomicU64::new(self.target_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.enqueued(), 0);
        assert_eq!(metrics.forwarded(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.target_failures(), 0);
    }

    #[test]
    fn test_record_dropped_returns_previous() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_enqueued();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }
        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_clone_is_snapshot() {
        let metrics = QueueMetrics::new();
        metrics.record_forwarded();
        let snapshot = metrics.clone();
        metrics.record_forwarded();
        assert_eq!(snapshot.forwarded(), 1);
        assert_eq!(metrics.forwarded(), 2);
    }
}
