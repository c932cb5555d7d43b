//! # Rust Log Manager
//!
//! A hierarchical logging core: named loggers arranged in a dot-separated
//! tree with inherited levels, a dispatch pipeline that walks handler chains
//! from a logger up to the root, and an asynchronous handler that moves
//! delivery onto a background thread through a bounded queue.
//!
//! ## Features
//!
//! - **Level inheritance**: a logger without an explicit level uses its
//!   nearest configured ancestor's, and level checks are a single atomic load
//! - **Handler delegation**: events reach every handler from the emitting
//!   logger up to the first logger that stops delegating to its parent
//! - **Async offload**: [`handlers::AsyncHandler`] with `Block` or `Discard`
//!   overflow behavior
//! - **Diagnostic context**: thread-local [`Mdc`] and [`Ndc`] captured into
//!   every event
//!
//! ```
//! use rust_log_manager::prelude::*;
//! use std::sync::Arc;
//!
//! let context = LogContext::new(false);
//! let memory = Arc::new(QueueHandler::new(32));
//! context.root_logger().add_handler(memory.clone());
//!
//! let db = context.logger("app.db");
//! context.logger("app").set_level(Some(LogLevel::Warn));
//!
//! db.info("not shown");
//! db.error("connection lost");
//! assert_eq!(memory.messages(), vec!["connection lost"]);
//! ```

pub mod core;
pub mod handlers;
pub mod macros;

#[cfg(feature = "log-bridge")]
pub mod bridge;

pub mod prelude {
    pub use crate::core::{
        ErrorCode, ErrorManager, FieldValue, Filter, FormatStyle, Handler, HandlerBase,
        LevelConfig, LogContext, LogEvent, LogLevel, Logger, LoggerError, Mdc, Ndc,
        OverflowPolicy, Result, SharedFilter, SharedHandler,
    };
    pub use crate::handlers::{AsyncHandler, AsyncState, QueueHandler};
}

pub use crate::core::{
    AsyncHandlerConfig, CallerInfo, ErrorCode, ErrorManager, FieldValue, Filter, FormatStyle,
    Handler, HandlerBase, LevelConfig, LogContext, LogContextSelector, LogEvent, LogLevel, Logger,
    LoggerError, MapBundle, Mdc, Ndc, OverflowCallback, OverflowPolicy, QueueMetrics,
    ResourceBundle, Result, SharedHandler, StaticContextSelector, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::handlers::{AsyncHandler, AsyncHandlerBuilder, AsyncState, QueueHandler};
