//! Handler implementations

pub mod async_handler;
pub mod queue_handler;

pub use async_handler::{AsyncHandler, AsyncHandlerBuilder, AsyncState};
pub use queue_handler::QueueHandler;

pub use crate::core::{Handler, HandlerBase};
