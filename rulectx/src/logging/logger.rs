//! Logger collaborators and the built-in implementations.

use super::{LogLevel, LogRecord};
use crate::context::Context;

/// A sink for log calls made through a context.
///
/// A single logger is shared by a context and all of its descendants, so
/// implementations must tolerate concurrent calls and must not block
/// indefinitely.
#[cfg_attr(test, mockall::automock)]
pub trait Logger: Send + Sync {
    /// Logs `args` for the operation `op` at `level`.
    fn log(&self, level: LogLevel, op: &str, args: &[serde_json::Value]);
}

/// Logger backed by the `tracing` ecosystem.
///
/// This is what a context falls back to when no logger is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, op: &str, args: &[serde_json::Value]) {
        match level {
            LogLevel::Everything | LogLevel::Extra | LogLevel::Fine => {
                tracing::trace!(op, ?args, severity = %level, "context log");
            }
            LogLevel::Debug => tracing::debug!(op, ?args, "context log"),
            LogLevel::Info => tracing::info!(op, ?args, "context log"),
            LogLevel::Warn => tracing::warn!(op, ?args, "context log"),
            LogLevel::Error | LogLevel::Critical => {
                tracing::error!(op, ?args, severity = %level, "context log");
            }
            LogLevel::Nothing => {}
        }
    }
}

/// Logger that discards everything. Used by benchmark contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchLogger;

impl Logger for BenchLogger {
    fn log(&self, _level: LogLevel, _op: &str, _args: &[serde_json::Value]) {}
}

static DEFAULT_LOGGER: TracingLogger = TracingLogger;

/// Returns the logger used by contexts that have none attached.
#[must_use]
pub fn default_logger() -> &'static dyn Logger {
    &DEFAULT_LOGGER
}

/// Called for every record that passes a context's verbosity.
pub trait LogHook: Send + Sync {
    /// Observes a record.
    fn on_log(&self, record: &LogRecord);
}

impl<F> LogHook for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn on_log(&self, record: &LogRecord) {
        self(record);
    }
}

/// Called from [`Context::point`] to instrument named points in a pipeline.
pub trait PointHook: Send + Sync {
    /// Observes a point reached by `ctx`.
    fn on_point(&self, ctx: &Context, point: &str, args: &[serde_json::Value]);
}

impl<F> PointHook for F
where
    F: Fn(&Context, &str, &[serde_json::Value]) + Send + Sync,
{
    fn on_point(&self, ctx: &Context, point: &str, args: &[serde_json::Value]) {
        self(ctx, point, args);
    }
}
