//! Logging collaborators for contexts.
//!
//! This module provides:
//! - Ordered log levels used for verbosity and accumulator thresholds
//! - The `Logger` trait plus tracing-backed and no-op implementations
//! - A bounded `Accumulator` for collecting records
//! - Hooks for observing records and instrumentation points

mod accumulator;
mod level;
mod logger;

pub use accumulator::{Accumulator, LogRecord};
pub use level::LogLevel;
pub use logger::{default_logger, BenchLogger, LogHook, Logger, PointHook, TracingLogger};

#[cfg(test)]
pub use logger::MockLogger;
