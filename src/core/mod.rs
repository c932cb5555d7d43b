//! Core logger types and traits

pub mod config;
pub mod context;
pub mod diagnostic;
pub(crate) mod dispatch;
pub mod error;
pub mod error_manager;
pub mod field_value;
pub mod filter;
pub mod handler;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub(crate) mod node;
pub mod overflow_policy;
pub mod resource_bundle;
pub(crate) mod tree;

pub use config::{
    parse_level_setting, AsyncHandlerConfig, LevelConfig, DEFAULT_QUEUE_LENGTH,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use context::{LogContext, LogContextSelector, StaticContextSelector};
pub use diagnostic::{Mdc, MdcGuard, MdcSnapshot, Ndc, NdcGuard, NdcSnapshot};
pub use error::{LoggerError, Result};
pub use error_manager::{
    default_error_manager, ErrorCode, ErrorManager, OnlyOnceErrorManager, SharedErrorManager,
    StderrErrorManager,
};
pub use field_value::FieldValue;
pub use filter::{
    AcceptAll, AllFilter, AnyFilter, DenyAll, Filter, InvertFilter, LevelRangeFilter, SharedFilter,
};
pub use handler::{Handler, HandlerBase, SharedHandler};
pub use log_event::{CallerInfo, FormatStyle, LogEvent, SharedError};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use metrics::QueueMetrics;
pub use node::{DEFAULT_ROOT_LEVEL, SEPARATOR};
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use resource_bundle::{MapBundle, ResourceBundle};
