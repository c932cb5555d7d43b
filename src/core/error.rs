//! Error types for the log manager

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A level name that does not parse
    #[error("Invalid log level: '{value}'")]
    InvalidLevel { value: String },

    /// Invalid argument passed to an administrative call
    #[error("Invalid argument for {component}: {message}")]
    InvalidArgument { component: String, message: String },

    /// Handler used after close
    ///
    /// Not produced by the handlers in this crate, which ignore late events;
    /// available to handler implementations that want to surface it.
    #[error("Handler '{name}' is closed")]
    HandlerClosed { name: String },

    /// Handler reported a failure while publishing, flushing or closing
    ///
    /// Constructed by handler implementations outside this crate.
    #[error("Handler '{name}' failed: {message}")]
    HandlerFailure { name: String, message: String },

    /// A handler or filter panicked; the panic payload is kept as text
    #[error("{component} panicked: {message}")]
    Panicked { component: String, message: String },

    /// The async worker thread could not be started
    #[error("Failed to spawn async worker: {message}")]
    WorkerSpawn { message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid level error
    pub fn invalid_level(value: impl Into<String>) -> Self {
        LoggerError::InvalidLevel {
            value: value.into(),
        }
    }

    /// Create an invalid argument (configuration) error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidArgument {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a handler closed error
    pub fn closed(name: impl Into<String>) -> Self {
        LoggerError::HandlerClosed { name: name.into() }
    }

    /// Create a handler failure error
    pub fn handler(name: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HandlerFailure {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Convert a caught panic payload into an error
    pub fn from_panic(component: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        LoggerError::Panicked {
            component: component.into(),
            message,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
