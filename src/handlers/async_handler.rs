//! Asynchronous offload handler
//!
//! An [`AsyncHandler`] accepts events on the caller's thread and hands them to
//! a single worker thread through a bounded queue. The worker forwards each
//! event, in arrival order, to the target handlers. When the queue is full
//! the [`OverflowPolicy`] decides whether the producer waits or the event is
//! dropped.

use crate::core::config::{parse_level_setting, AsyncHandlerConfig};
use crate::core::handler::{guarded, publish_reporting};
use crate::core::node::same_handler;
use crate::core::{
    ErrorCode, Handler, HandlerBase, LogEvent, LoggerError, OverflowCallback, OverflowPolicy,
    QueueMetrics, Result, SharedErrorManager, SharedHandler, DEFAULT_QUEUE_LENGTH,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const CLOSING: u8 = 2;
const CLOSED: u8 = 3;

/// Lifecycle of an [`AsyncHandler`]
///
/// `Stopped -> Running -> Closing -> Closed`, or `Stopped -> Closed` when the
/// handler is closed before its first event. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncState {
    Stopped,
    Running,
    Closing,
    Closed,
}

impl AsyncState {
    fn from_u8(value: u8) -> Self {
        match value {
            STOPPED => AsyncState::Stopped,
            RUNNING => AsyncState::Running,
            CLOSING => AsyncState::Closing,
            _ => AsyncState::Closed,
        }
    }
}

/// State the worker thread shares with the handler
struct Shared {
    targets: ArcSwap<Vec<SharedHandler>>,
    metrics: QueueMetrics,
}

impl Shared {
    fn forward(&self, event: &LogEvent) {
        for target in self.targets.load().iter() {
            if !publish_reporting(target.as_ref(), event) {
                self.metrics.record_target_failure();
            }
        }
        self.metrics.record_forwarded();
    }
}

/// Handler that forwards events to its targets on a background thread
///
/// The worker is started lazily by the first published event. `close` drains
/// the queue, stops the worker and, unless configured otherwise, closes the
/// targets.
///
/// # Example
///
/// ```
/// use rust_log_manager::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(QueueHandler::new(16));
/// let offload = AsyncHandler::builder()
///     .queue_length(64)
///     .overflow(OverflowPolicy::Block)
///     .target(memory.clone())
///     .build()
///     .unwrap();
///
/// offload.publish(&LogEvent::new(LogLevel::Info, "queued")).unwrap();
/// offload.close().unwrap();
/// assert_eq!(memory.messages(), vec!["queued"]);
/// ```
pub struct AsyncHandler {
    base: HandlerBase,
    shared: Arc<Shared>,
    state: AtomicU8,
    queue_length: usize,
    overflow: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    close_targets: bool,
    shutdown_timeout: Duration,
    sender: Sender<LogEvent>,
    receiver: Receiver<LogEvent>,
    // dropping the sender wakes the worker and any blocked producer
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    // producers hold a read guard from the state check until their event is
    // queued; close takes the write guard to wait them out
    admission: RwLock<()>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AsyncHandler {
    pub fn builder() -> AsyncHandlerBuilder {
        AsyncHandlerBuilder::new()
    }

    /// Build from serializable settings
    pub fn from_config(config: &AsyncHandlerConfig, targets: Vec<SharedHandler>) -> Result<Self> {
        config.validate()?;
        let mut builder = AsyncHandlerBuilder::new()
            .name(config.name.clone())
            .queue_length(config.queue_length)
            .overflow(config.overflow)
            .close_targets(config.close_targets)
            .shutdown_timeout(config.shutdown_timeout())
            .targets(targets);
        if let Some(Some(level)) = config.level.as_deref().map(parse_level_setting).transpose()? {
            builder = builder.level(level);
        }
        builder.build()
    }

    /// Level, filter and error manager of this handler
    pub fn base(&self) -> &HandlerBase {
        &self.base
    }

    pub fn state(&self) -> AsyncState {
        AsyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn queue_length(&self) -> usize {
        self.queue_length
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Events waiting in the queue
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.shared.metrics
    }

    pub fn targets(&self) -> Arc<Vec<SharedHandler>> {
        self.shared.targets.load_full()
    }

    pub fn add_target(&self, target: SharedHandler) {
        self.shared.targets.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&target));
            next
        });
    }

    /// Remove every occurrence of `target`; returns whether one was present
    pub fn remove_target(&self, target: &SharedHandler) -> bool {
        let previous = self.shared.targets.rcu(|current| {
            current
                .iter()
                .filter(|h| !same_handler(h, target))
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|h| same_handler(h, target))
    }

    /// Start the worker if this is the first use
    ///
    /// Returns `false` once the handler is closing or closed.
    fn ensure_started(&self) -> Result<bool> {
        match self.state.load(Ordering::Acquire) {
            RUNNING => return Ok(true),
            STOPPED => {}
            _ => return Ok(false),
        }

        // held across the transition so close never sees RUNNING without a handle
        let mut worker = self.worker.lock();
        match self
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                *worker = Some(self.spawn_worker()?);
                Ok(true)
            }
            Err(RUNNING) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn spawn_worker(&self) -> Result<thread::JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let events = self.receiver.clone();
        let shutdown = self.shutdown_rx.clone();

        let spawned = thread::Builder::new()
            .name(format!("{}-worker", self.base.name()))
            .spawn(move || run_worker(shared, events, shutdown));

        match spawned {
            Ok(handle) => Ok(handle),
            Err(e) => {
                self.state.store(CLOSED, Ordering::Release);
                self.base.mark_closed();
                Err(LoggerError::WorkerSpawn {
                    message: e.to_string(),
                })
            }
        }
    }

    fn handle_full(&self, event: LogEvent) -> Result<()> {
        self.shared.metrics.record_queue_full();
        match self.overflow {
            OverflowPolicy::Discard => {
                self.discard();
                Ok(())
            }
            OverflowPolicy::Block => {
                self.shared.metrics.record_block();
                self.send_blocking(event, None);
                Ok(())
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.shared.metrics.record_block();
                self.send_blocking(event, Some(timeout));
                Ok(())
            }
        }
    }

    /// Wait for space, giving up when the handler closes or `timeout` expires
    fn send_blocking(&self, event: LogEvent, timeout: Option<Duration>) {
        let sent = match timeout {
            None => select! {
                send(self.sender, event) -> res => res.is_ok(),
                recv(self.shutdown_rx) -> _ => false,
            },
            Some(timeout) => select! {
                send(self.sender, event) -> res => res.is_ok(),
                recv(self.shutdown_rx) -> _ => false,
                default(timeout) => {
                    self.discard();
                    return;
                }
            },
        };
        if sent {
            self.shared.metrics.record_enqueued();
        } else {
            self.shared.metrics.record_dropped();
        }
    }

    fn discard(&self) {
        let previous = self.shared.metrics.record_dropped();
        if let Some(callback) = &self.on_overflow {
            callback(previous + 1);
        }
    }

    /// Wait for the worker to finish, polling until the shutdown timeout
    ///
    /// Returns `false` if the worker is still running when the timeout expires.
    fn join_worker(&self) -> bool {
        let Some(handle) = self.worker.lock().take() else {
            return true;
        };
        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    self.base.report(
                        &format!("Async handler '{}' worker panicked", self.base.name()),
                        None,
                        ErrorCode::CloseFailure,
                    );
                }
                return true;
            }
            if start.elapsed() >= self.shutdown_timeout {
                self.base.report(
                    &format!(
                        "Async handler '{}' worker did not finish within {:?}; \
                         pending events may be lost",
                        self.base.name(),
                        self.shutdown_timeout
                    ),
                    None,
                    ErrorCode::CloseFailure,
                );
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Block until another caller's close has finished
    fn wait_for_closed(&self) {
        while self.state.load(Ordering::Acquire) != CLOSED {
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn close_target_handlers(&self) {
        if !self.close_targets {
            return;
        }
        for target in self.shared.targets.load().iter() {
            if let Err(e) = guarded(target.name(), || target.close()) {
                target.error_manager().error(
                    &format!("Handler '{}' failed to close", target.name()),
                    Some(&e),
                    ErrorCode::CloseFailure,
                );
            }
        }
    }
}

fn run_worker(shared: Arc<Shared>, events: Receiver<LogEvent>, shutdown: Receiver<()>) {
    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) => shared.forward(&event),
                Err(_) => break,
            },
            recv(shutdown) -> _ => {
                while let Ok(event) = events.try_recv() {
                    shared.forward(&event);
                }
                break;
            }
        }
    }
}

impl Handler for AsyncHandler {
    /// Queue `event` for the worker
    ///
    /// The event is materialized first so that its caller, MDC and NDC are
    /// those of the calling thread. After `close` this is a silent no-op.
    fn publish(&self, event: &LogEvent) -> Result<()> {
        if !self.base.is_loggable(event) {
            return Ok(());
        }
        let _admitted = self.admission.read();
        if !self.ensure_started()? {
            return Ok(());
        }
        event.materialize();

        match self.sender.try_send(event.clone()) {
            Ok(()) => {
                self.shared.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(event)) => self.handle_full(event),
            Err(TrySendError::Disconnected(_)) => Ok(()),
        }
    }

    /// Flush the targets; queued events are not waited for
    fn flush(&self) -> Result<()> {
        for target in self.shared.targets.load().iter() {
            if let Err(e) = guarded(target.name(), || target.flush()) {
                target.error_manager().error(
                    &format!("Handler '{}' failed to flush", target.name()),
                    Some(&e),
                    ErrorCode::FlushFailure,
                );
            }
        }
        Ok(())
    }

    /// Drain the queue, stop the worker and close the targets
    ///
    /// Idempotent. Every caller returns only once the handler is `Closed`, so
    /// delivery of accepted events has finished by then.
    fn close(&self) -> Result<()> {
        loop {
            match self.state.load(Ordering::Acquire) {
                STOPPED => {
                    if self
                        .state
                        .compare_exchange(STOPPED, CLOSED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.base.mark_closed();
                        self.close_target_handlers();
                        return Ok(());
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, CLOSING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        break;
                    }
                }
                _ => {
                    self.wait_for_closed();
                    return Ok(());
                }
            }
        }

        // wakes the worker and blocked producers, then waits out in-flight sends
        self.shutdown_tx.lock().take();
        drop(self.admission.write());

        if self.join_worker() {
            // sends that raced the worker's final drain
            while let Ok(event) = self.receiver.try_recv() {
                self.shared.forward(&event);
            }
        }
        self.state.store(CLOSED, Ordering::Release);
        self.base.mark_closed();
        self.close_target_handlers();
        Ok(())
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn error_manager(&self) -> SharedErrorManager {
        self.base.error_manager()
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        let _ = self.close();

        let dropped = self.shared.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Async handler '{}' dropped {} event(s) during its lifetime",
                self.base.name(),
                dropped
            );
        }
    }
}

impl fmt::Debug for AsyncHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandler")
            .field("name", &self.base.name())
            .field("state", &self.state())
            .field("queue_length", &self.queue_length)
            .field("overflow", &self.overflow)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Builder for [`AsyncHandler`]
pub struct AsyncHandlerBuilder {
    name: String,
    queue_length: usize,
    overflow: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    close_targets: bool,
    shutdown_timeout: Duration,
    level: Option<crate::core::LogLevel>,
    targets: Vec<SharedHandler>,
}

impl AsyncHandlerBuilder {
    pub fn new() -> Self {
        Self {
            name: "async".to_string(),
            queue_length: DEFAULT_QUEUE_LENGTH,
            overflow: OverflowPolicy::default(),
            on_overflow: None,
            close_targets: true,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            level: None,
            targets: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn queue_length(mut self, queue_length: usize) -> Self {
        self.queue_length = queue_length;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Called with the total drop count whenever an event is discarded
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn close_targets(mut self, close_targets: bool) -> Self {
        self.close_targets = close_targets;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn level(mut self, level: crate::core::LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn target(mut self, target: SharedHandler) -> Self {
        self.targets.push(target);
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = SharedHandler>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn build(self) -> Result<AsyncHandler> {
        if self.queue_length == 0 {
            return Err(LoggerError::config(
                "AsyncHandler",
                "queue_length must be at least 1",
            ));
        }
        let (sender, receiver) = bounded(self.queue_length);
        let (shutdown_tx, shutdown_rx) = bounded(0);

        let base = HandlerBase::new(self.name);
        if let Some(level) = self.level {
            base.set_level(level);
        }

        Ok(AsyncHandler {
            base,
            shared: Arc::new(Shared {
                targets: ArcSwap::from_pointee(self.targets),
                metrics: QueueMetrics::new(),
            }),
            state: AtomicU8::new(STOPPED),
            queue_length: self.queue_length,
            overflow: self.overflow,
            on_overflow: self.on_overflow,
            close_targets: self.close_targets,
            shutdown_timeout: self.shutdown_timeout,
            sender,
            receiver,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            admission: RwLock::new(()),
            worker: Mutex::new(None),
        })
    }
}

impl Default for AsyncHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
