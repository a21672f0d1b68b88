//! Logging
//!
//! Structured logging for UMA operations.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// UMA log context.
#[derive(Debug, Clone, Default)]
pub struct UmaLogContext {
    /// Operation name.
    pub operation: Option<String>,
    /// Authorization server or token endpoint.
    pub authorization_server: Option<String>,
    /// Resource being accessed.
    pub resource: Option<String>,
    /// Negotiation round.
    pub round: Option<u32>,
    /// Additional context.
    pub extra: BTreeMap<String, String>,
}

impl UmaLogContext {
    /// Create new log context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set operation.
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set authorization server.
    pub fn authorization_server(mut self, server: impl Into<String>) -> Self {
        self.authorization_server = Some(server.into());
        self
    }

    /// Set resource.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set negotiation round.
    pub fn round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    /// Add extra context.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn extra_fields(&self) -> String {
        self.extra
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logger interface.
pub trait Logger: Send + Sync {
    /// Log at trace level.
    fn trace(&self, message: &str, context: &UmaLogContext);

    /// Log at debug level.
    fn debug(&self, message: &str, context: &UmaLogContext);

    /// Log at info level.
    fn info(&self, message: &str, context: &UmaLogContext);

    /// Log at warn level.
    fn warn(&self, message: &str, context: &UmaLogContext);

    /// Log at error level.
    fn error(&self, message: &str, context: &UmaLogContext);

    /// Check if a log level is enabled.
    fn is_enabled(&self, level: LogLevel) -> bool;
}

/// No-op logger implementation.
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn trace(&self, _message: &str, _context: &UmaLogContext) {}
    fn debug(&self, _message: &str, _context: &UmaLogContext) {}
    fn info(&self, _message: &str, _context: &UmaLogContext) {}
    fn warn(&self, _message: &str, _context: &UmaLogContext) {}
    fn error(&self, _message: &str, _context: &UmaLogContext) {}
    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// No-op logger singleton.
pub fn no_op_logger() -> NoOpLogger {
    NoOpLogger
}

/// Logger that emits `tracing` events under the `uma` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

macro_rules! emit {
    ($level:ident, $message:expr, $context:expr) => {{
        let context = $context;
        tracing::$level!(
            target: "uma",
            operation = context.operation.as_deref().unwrap_or(""),
            authorization_server = context.authorization_server.as_deref().unwrap_or(""),
            resource = context.resource.as_deref().unwrap_or(""),
            round = context.round.unwrap_or(0),
            extra = %context.extra_fields(),
            "{}",
            $message
        )
    }};
}

impl Logger for TracingLogger {
    fn trace(&self, message: &str, context: &UmaLogContext) {
        emit!(trace, message, context);
    }

    fn debug(&self, message: &str, context: &UmaLogContext) {
        emit!(debug, message, context);
    }

    fn info(&self, message: &str, context: &UmaLogContext) {
        emit!(info, message, context);
    }

    fn warn(&self, message: &str, context: &UmaLogContext) {
        emit!(warn, message, context);
    }

    fn error(&self, message: &str, context: &UmaLogContext) {
        emit!(error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: "uma", tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: "uma", tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: "uma", tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(target: "uma", tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(target: "uma", tracing::Level::ERROR),
        }
    }
}

/// Log entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: UmaLogContext,
    pub timestamp: u64,
}

/// In-memory logger for testing.
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
    min_level: LogLevel,
}

impl InMemoryLogger {
    /// Create new in-memory logger.
    pub fn new() -> Self {
        Self::with_level(LogLevel::Trace)
    }

    /// Create in-memory logger with minimum level.
    pub fn with_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Get all log entries.
    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Get entries by level.
    pub fn get_entries_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn log(&self, level: LogLevel, message: &str, context: &UmaLogContext) {
        if level >= self.min_level {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            self.entries.lock().unwrap().push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
                timestamp: now,
            });
        }
    }
}

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for InMemoryLogger {
    fn trace(&self, message: &str, context: &UmaLogContext) {
        self.log(LogLevel::Trace, message, context);
    }

    fn debug(&self, message: &str, context: &UmaLogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &UmaLogContext) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &UmaLogContext) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &UmaLogContext) {
        self.log(LogLevel::Error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

/// Create in-memory logger for testing.
pub fn create_in_memory_logger() -> InMemoryLogger {
    InMemoryLogger::new()
}

/// Create the default `tracing`-backed logger.
pub fn create_tracing_logger() -> TracingLogger {
    TracingLogger
}
