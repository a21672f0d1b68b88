//! Telemetry
//!
//! Structured logging for UMA operations. The default logger forwards to
//! `tracing`; an in-memory logger captures entries for tests.

pub mod logging;

pub use logging::{
    create_in_memory_logger, create_tracing_logger, no_op_logger, InMemoryLogger, LogEntry,
    LogLevel, Logger, NoOpLogger, TracingLogger, UmaLogContext,
};
