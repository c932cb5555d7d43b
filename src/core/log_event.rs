//! Log event structure

use super::diagnostic::{Mdc, MdcSnapshot, Ndc, NdcSnapshot};
use super::field_value::FieldValue;
use super::log_level::LogLevel;
use super::resource_bundle::ResourceBundle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<Arc<str>>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<Arc<str>>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> Arc<str> {
    THREAD_ID_CACHE.with(|cache| {
        Arc::clone(
            cache
                .borrow_mut()
                .get_or_insert_with(|| format!("{:?}", std::thread::current().id()).into()),
        )
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<Arc<str>> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(Arc::from))
            .clone()
    })
}

/// How parameters are substituted into the raw message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatStyle {
    /// The raw message is used verbatim
    #[default]
    NoFormat,
    /// `{0}`, `{1}`, ... refer to parameters by index
    Positional,
    /// `%s` and `%d` consume parameters in order, `%%` is a literal percent
    Printf,
}

/// Source location of the emit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
    pub module_path: Option<&'static str>,
}

pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A single log event.
///
/// Everything except the resource bundle and logger name is fixed at
/// construction. The diagnostic context is snapshotted from the creating
/// thread; the formatted message and caller info are computed on first use
/// and memoized. Call [`LogEvent::materialize`] before handing an event to
/// another thread.
#[derive(Debug, Clone)]
pub struct LogEvent {
    level: LogLevel,
    logger_name: Arc<str>,
    message: Arc<str>,
    params: Arc<[FieldValue]>,
    style: FormatStyle,
    thrown: Option<SharedError>,
    bundle: Option<Arc<dyn ResourceBundle>>,
    timestamp: DateTime<Utc>,
    sequence: u64,
    thread_id: Arc<str>,
    thread_name: Option<Arc<str>>,
    mdc: MdcSnapshot,
    ndc: NdcSnapshot,
    location: Option<&'static Location<'static>>,
    module_path: Option<&'static str>,
    calculate_caller: bool,
    formatted: OnceLock<String>,
    caller: OnceLock<Option<CallerInfo>>,
}

impl LogEvent {
    /// Create an event attributed to the caller's source location
    #[track_caller]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: Arc::from(""),
            message: Arc::from(message.into()),
            params: Arc::from(Vec::new()),
            style: FormatStyle::NoFormat,
            thrown: None,
            bundle: None,
            timestamp: Utc::now(),
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            mdc: Mdc::copy(),
            ndc: Ndc::copy(),
            location: Some(Location::caller()),
            module_path: None,
            calculate_caller: true,
            formatted: OnceLock::new(),
            caller: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_params<I, V>(mut self, style: FormatStyle, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.style = style;
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: SharedError) -> Self {
        self.thrown = Some(error);
        self
    }

    #[must_use]
    pub fn with_logger_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.logger_name = name.into();
        self
    }

    #[must_use]
    pub fn with_resource_bundle(mut self, bundle: Arc<dyn ResourceBundle>) -> Self {
        self.set_resource_bundle(bundle);
        self
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: &'static str) -> Self {
        self.module_path = Some(module_path);
        self
    }

    /// Attribute the event to an explicit caller instead of the construction site
    #[must_use]
    pub fn with_caller(self, caller: CallerInfo) -> Self {
        let mut event = self;
        event.location = None;
        event.caller = OnceLock::from(Some(caller));
        event
    }

    /// Skip caller computation entirely; `caller()` will return `None`
    pub fn disable_caller_calculation(&mut self) {
        self.calculate_caller = false;
        self.location = None;
        self.caller = OnceLock::from(None);
    }

    pub(crate) fn set_logger_name(&mut self, name: Arc<str>) {
        self.logger_name = name;
    }

    pub(crate) fn set_resource_bundle(&mut self, bundle: Arc<dyn ResourceBundle>) {
        self.bundle = Some(bundle);
        // the pattern may change
        self.formatted = OnceLock::new();
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Raw message, before parameter substitution and localization
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn params(&self) -> &[FieldValue] {
        &self.params
    }

    pub fn format_style(&self) -> FormatStyle {
        self.style
    }

    pub fn thrown(&self) -> Option<&SharedError> {
        self.thrown.as_ref()
    }

    pub fn resource_bundle(&self) -> Option<&Arc<dyn ResourceBundle>> {
        self.bundle.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    pub fn mdc(&self) -> &MdcSnapshot {
        &self.mdc
    }

    pub fn mdc_value(&self, key: &str) -> Option<&str> {
        self.mdc.get(key).map(String::as_str)
    }

    /// NDC entries joined with `.`
    pub fn ndc(&self) -> String {
        self.ndc.join(".")
    }

    pub fn ndc_entries(&self) -> &[String] {
        &self.ndc
    }

    /// Whether the message has to be looked up in a resource bundle
    pub fn needs_localization(&self) -> bool {
        self.bundle.is_none()
    }

    pub fn is_caller_calculated(&self) -> bool {
        self.calculate_caller
    }

    /// Message with parameters substituted, memoized after the first call
    pub fn formatted_message(&self) -> &str {
        self.formatted.get_or_init(|| {
            let pattern = self
                .bundle
                .as_ref()
                .and_then(|bundle| bundle.get(&self.message))
                .unwrap_or(&*self.message);
            match self.style {
                FormatStyle::NoFormat => pattern.to_string(),
                _ if self.params.is_empty() => pattern.to_string(),
                FormatStyle::Positional => format_positional(pattern, &self.params),
                FormatStyle::Printf => format_printf(pattern, &self.params),
            }
        })
    }

    /// Caller location, or `None` when caller calculation is disabled
    pub fn caller(&self) -> Option<&CallerInfo> {
        self.caller
            .get_or_init(|| {
                if !self.calculate_caller {
                    return None;
                }
                self.location.map(|location| CallerInfo {
                    file: location.file(),
                    line: location.line(),
                    column: location.column(),
                    module_path: self.module_path,
                })
            })
            .as_ref()
    }

    /// Compute every lazy field now, on the calling thread
    pub fn materialize(&self) {
        self.formatted_message();
        self.caller();
    }
}

fn format_positional(pattern: &str, params: &[FieldValue]) -> String {
    let mut out = String::with_capacity(pattern.len() + params.len() * 8);
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            params.get(index).map(|param| (param, close))
        });
        match substituted {
            Some((param, close)) => {
                out.push_str(&param.to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_printf(pattern: &str, params: &[FieldValue]) -> String {
    let mut out = String::with_capacity(pattern.len() + params.len() * 8);
    let mut next = params.iter();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(spec @ ('s' | 'd')) => {
                chars.next();
                match next.next() {
                    Some(param) => out.push_str(&param.to_string()),
                    None => {
                        out.push('%');
                        out.push(spec);
                    }
                }
            }
            _ => out.push('%'),
        }
    }
    out
}
