//! Serializable configuration for levels and async handlers
//!
//! These types carry no file format of their own; any serde format can
//! produce them.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::overflow_policy::OverflowPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default shutdown timeout for async handler cleanup (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default async queue length
pub const DEFAULT_QUEUE_LENGTH: usize = 512;

/// Parse a level setting; `""` and `"INHERIT"` mean "no explicit level"
pub fn parse_level_setting(value: &str) -> Result<Option<LogLevel>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("inherit") {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

/// Levels for a set of loggers
///
/// ```
/// use rust_log_manager::LevelConfig;
///
/// let mut config = LevelConfig::default();
/// config.root = Some("WARN".into());
/// config.loggers.insert("app.db".into(), "DEBUG".into());
/// assert_eq!(config.parse().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Level of the root logger
    pub root: Option<String>,
    /// Logger name to level name
    pub loggers: BTreeMap<String, String>,
}

impl LevelConfig {
    /// Parse every entry, failing on the first invalid level name
    pub fn parse(&self) -> Result<Vec<(String, Option<LogLevel>)>> {
        let mut out = Vec::with_capacity(self.loggers.len() + 1);
        if let Some(root) = &self.root {
            out.push((String::new(), parse_level_setting(root)?));
        }
        for (name, level) in &self.loggers {
            out.push((name.clone(), parse_level_setting(level)?));
        }
        Ok(out)
    }
}

/// Settings for an [`AsyncHandler`](crate::handlers::AsyncHandler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncHandlerConfig {
    pub name: String,
    pub queue_length: usize,
    pub overflow: OverflowPolicy,
    /// Close the target handlers when the async handler closes
    pub close_targets: bool,
    pub shutdown_timeout_ms: u64,
    /// Threshold of the handler itself
    pub level: Option<String>,
}

impl Default for AsyncHandlerConfig {
    fn default() -> Self {
        Self {
            name: "async".to_string(),
            queue_length: DEFAULT_QUEUE_LENGTH,
            overflow: OverflowPolicy::default(),
            close_targets: true,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
            level: None,
        }
    }
}

impl AsyncHandlerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_length == 0 {
            return Err(LoggerError::config(
                "AsyncHandler",
                "queue_length must be at least 1",
            ));
        }
        if let Some(level) = &self.level {
            parse_level_setting(level)?;
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
