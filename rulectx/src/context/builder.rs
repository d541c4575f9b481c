//! Builder for root contexts with explicitly injected collaborators.

use super::location::Location;
use super::span::Tracer;
use super::state::PropertyMap;
use super::Context;
use crate::cancellation::CancellationToken;
use crate::logging::{Accumulator, LogHook, LogLevel, Logger, PointHook};
use crate::ports::App;
use std::sync::Arc;

/// Builds a root [`Context`].
///
/// Anything not set falls back to the same defaults as [`Context::new`].
#[must_use]
pub struct ContextBuilder {
    pub(crate) app_id: String,
    pub(crate) verbosity: LogLevel,
    pub(crate) read_key: String,
    pub(crate) write_key: String,
    pub(crate) accumulator: Option<Arc<Accumulator>>,
    pub(crate) accumulator_level: LogLevel,
    pub(crate) log_hook: Option<Arc<dyn LogHook>>,
    pub(crate) point_hook: Option<Arc<dyn PointHook>>,
    pub(crate) app: Option<Arc<dyn App>>,
    pub(crate) tracer: Option<Arc<dyn Tracer>>,
    pub(crate) logger: Option<Arc<dyn Logger>>,
    pub(crate) cancellation: Option<Arc<CancellationToken>>,
    pub(crate) location: Option<Arc<Location>>,
    pub(crate) props: PropertyMap,
}

impl ContextBuilder {
    /// Creates a builder for the application `app_id`.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            verbosity: LogLevel::DEFAULT_VERBOSITY,
            read_key: String::new(),
            write_key: String::new(),
            accumulator: None,
            accumulator_level: LogLevel::ANY_WARN,
            log_hook: None,
            point_hook: None,
            app: None,
            tracer: None,
            logger: None,
            cancellation: None,
            location: None,
            props: PropertyMap::new(),
        }
    }

    /// Sets the verbosity.
    pub fn with_verbosity(mut self, verbosity: LogLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets the read key.
    pub fn with_read_key(mut self, key: impl Into<String>) -> Self {
        self.read_key = key.into();
        self
    }

    /// Sets the write key.
    pub fn with_write_key(mut self, key: impl Into<String>) -> Self {
        self.write_key = key.into();
        self
    }

    /// Attaches an accumulator.
    pub fn with_accumulator(mut self, accumulator: Arc<Accumulator>) -> Self {
        self.accumulator = Some(accumulator);
        self
    }

    /// Sets the minimum level forwarded to the accumulator.
    pub fn with_accumulator_level(mut self, level: LogLevel) -> Self {
        self.accumulator_level = level;
        self
    }

    /// Attaches a log hook.
    pub fn with_log_hook(mut self, hook: Arc<dyn LogHook>) -> Self {
        self.log_hook = Some(hook);
        self
    }

    /// Attaches a point hook.
    pub fn with_point_hook(mut self, hook: Arc<dyn PointHook>) -> Self {
        self.point_hook = Some(hook);
        self
    }

    /// Attaches an app.
    pub fn with_app(mut self, app: Arc<dyn App>) -> Self {
        self.app = Some(app);
        self
    }

    /// Attaches a tracer.
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Attaches a logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Uses an existing cancellation token instead of a fresh one.
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Sets the initial location.
    pub fn with_location(mut self, location: Arc<Location>) -> Self {
        self.location = Some(location);
        self
    }

    /// Seeds a property.
    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> Context {
        Context::from_builder(self)
    }
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("app_id", &self.app_id)
            .field("verbosity", &self.verbosity)
            .field("has_logger", &self.logger.is_some())
            .field("has_tracer", &self.tracer.is_some())
            .finish_non_exhaustive()
    }
}
