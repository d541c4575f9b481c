//! The request-scoped context threaded through a pipeline.

use super::location::{Location, LocationSlot};
use super::privilege::PrivilegeGrant;
use super::span::Tracer;
use super::state::{sanitize_log_key, ContextState, PropertyMap};
use super::ContextBuilder;
use crate::cancellation::CancellationToken;
use crate::errors::{AccessError, AccessKind, PrivilegeError};
use crate::logging::{
    default_logger, Accumulator, BenchLogger, LogHook, LogLevel, LogRecord, Logger, PointHook,
};
use crate::ports::{App, Bindings};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Generates a fresh context id.
pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Request-scoped state for one logical unit of work.
///
/// A root context is built once per request or rule-engine invocation.
/// Stages derive children with [`Context::fork`] before fanning out. A
/// child shares the parent's collaborators (logger, tracer, app, hooks,
/// accumulator, cancellation token) but owns independent copies of the
/// property maps, the location slot and the privilege slot.
///
/// Properties, logging metadata and the privilege slot sit behind one
/// reader/writer lock. The location is held in a lock-free slot and the id
/// never changes, so neither takes the lock.
pub struct Context {
    id: String,
    verbosity: LogLevel,
    location: LocationSlot<Location>,
    read_key: String,
    write_key: String,
    log_accumulator: Option<Arc<Accumulator>>,
    log_accumulator_level: LogLevel,
    log_hook: Option<Arc<dyn LogHook>>,
    point_hook: Option<Arc<dyn PointHook>>,
    app: Option<Arc<dyn App>>,
    tracer: Option<Arc<dyn Tracer>>,
    logger: Option<Arc<dyn Logger>>,
    cancellation: Arc<CancellationToken>,
    state: RwLock<ContextState>,
}

impl Context {
    /// Creates a root context for the application `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::builder(prefix).build()
    }

    /// Creates a root context for tests.
    #[must_use]
    pub fn for_test(prefix: impl Into<String>) -> Self {
        Self::new(prefix)
    }

    /// Creates a silent root context for benchmarks.
    ///
    /// Verbosity and the accumulator level are `Nothing` and the logger
    /// discards everything, so no log output is produced at any level.
    #[must_use]
    pub fn for_bench(prefix: impl Into<String>) -> Self {
        Self::builder(prefix)
            .with_verbosity(LogLevel::Nothing)
            .with_accumulator_level(LogLevel::Nothing)
            .with_logger(Arc::new(BenchLogger))
            .build()
    }

    /// Starts building a root context with explicit collaborators.
    #[must_use]
    pub fn builder(prefix: impl Into<String>) -> ContextBuilder {
        ContextBuilder::new(prefix)
    }

    pub(crate) fn from_builder(builder: ContextBuilder) -> Self {
        let mut state = ContextState::new();
        state.props = builder.props;
        state
            .log_props
            .insert("appId".to_string(), serde_json::Value::String(builder.app_id));

        Self {
            id: generate_id(),
            verbosity: builder.verbosity,
            location: LocationSlot::with_value(builder.location),
            read_key: builder.read_key,
            write_key: builder.write_key,
            log_accumulator: builder.accumulator,
            log_accumulator_level: builder.accumulator_level,
            log_hook: builder.log_hook,
            point_hook: builder.point_hook,
            app: builder.app,
            tracer: builder.tracer,
            logger: builder.logger,
            cancellation: builder
                .cancellation
                .unwrap_or_else(|| Arc::new(CancellationToken::new())),
            state: RwLock::new(state),
        }
    }

    /// Derives a child context.
    ///
    /// The parent's state is snapshotted under its read lock. The child gets
    /// a fresh id, copies of scalars, maps, location and privilege, and the
    /// same collaborator instances. Later changes on either side are not
    /// visible to the other.
    #[must_use]
    pub fn fork(&self) -> Self {
        let (state, location) = {
            let guard = self.state.read();
            (guard.clone(), self.location.snapshot())
        };

        let child = Self {
            id: generate_id(),
            verbosity: self.verbosity,
            location,
            read_key: self.read_key.clone(),
            write_key: self.write_key.clone(),
            log_accumulator: self.log_accumulator.clone(),
            log_accumulator_level: self.log_accumulator_level,
            log_hook: self.log_hook.clone(),
            point_hook: self.point_hook.clone(),
            app: self.app.clone(),
            tracer: self.tracer.clone(),
            logger: self.logger.clone(),
            cancellation: self.cancellation.clone(),
            state: RwLock::new(state),
        };
        tracing::trace!(parent = %self.id, child = %child.id, "forked context");
        child
    }

    /// Returns the context id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    // Properties

    /// Returns the property stored under `key`.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<serde_json::Value> {
        self.state.read().props.get(key).cloned()
    }

    /// Stores a property, replacing any previous value.
    pub fn add_prop(&self, key: impl Into<String>, value: serde_json::Value) {
        self.state.write().props.insert(key.into(), value);
    }

    /// Same as [`Context::add_prop`].
    pub fn set_value(&self, key: impl Into<String>, value: serde_json::Value) {
        self.add_prop(key, value);
    }

    /// Same as [`Context::add_prop`].
    pub fn add_value(&self, key: impl Into<String>, value: serde_json::Value) {
        self.add_prop(key, value);
    }

    /// Removes a property, returning its value.
    pub fn remove_prop(&self, key: &str) -> Option<serde_json::Value> {
        self.state.write().props.remove(key)
    }

    /// Returns a copy of all properties.
    #[must_use]
    pub fn props(&self) -> PropertyMap {
        self.state.read().props.clone()
    }

    // Logging metadata

    /// Attaches logging metadata. Dots in `key` become underscores.
    ///
    /// Guarded by the same lock as properties, so it is safe to call after
    /// the context has been shared.
    pub fn set_log_value(&self, key: &str, value: serde_json::Value) {
        self.state.write().log_props.insert(sanitize_log_key(key), value);
    }

    /// Returns one logging metadata value. `key` is sanitized the same way
    /// as in [`Context::set_log_value`].
    #[must_use]
    pub fn log_value(&self, key: &str) -> Option<serde_json::Value> {
        self.state.read().log_props.get(&sanitize_log_key(key)).cloned()
    }

    /// Returns a copy of all logging metadata.
    #[must_use]
    pub fn log_props(&self) -> PropertyMap {
        self.state.read().log_props.clone()
    }

    // Location

    /// Stores the current location, returning it.
    pub fn set_loc(&self, location: Arc<Location>) -> Arc<Location> {
        self.location.store(location)
    }

    /// Returns the current location, if one is set.
    #[must_use]
    pub fn get_loc(&self) -> Option<Arc<Location>> {
        self.location.load()
    }

    /// Same as [`Context::get_loc`].
    #[must_use]
    pub fn location(&self) -> Option<Arc<Location>> {
        self.get_loc()
    }

    /// Unsets the current location, returning the old one.
    pub fn clear_loc(&self) -> Option<Arc<Location>> {
        self.location.clear()
    }

    // Access keys

    /// The key presented to locations that require a read key.
    #[must_use]
    pub fn read_key(&self) -> &str {
        &self.read_key
    }

    /// The key presented to locations that require a write key.
    #[must_use]
    pub fn write_key(&self) -> &str {
        &self.write_key
    }

    /// Sets the read key. Only the owner may do this, before sharing.
    pub fn set_read_key(&mut self, key: impl Into<String>) {
        self.read_key = key.into();
    }

    /// Sets the write key. Only the owner may do this, before sharing.
    pub fn set_write_key(&mut self, key: impl Into<String>) {
        self.write_key = key.into();
    }

    /// Returns true if this context may use `location`'s read APIs.
    #[must_use]
    pub fn can_read(&self, location: &Location) -> bool {
        location.mode.allows_read(&self.read_key)
    }

    /// Returns true if this context may use `location`'s write APIs.
    #[must_use]
    pub fn can_write(&self, location: &Location) -> bool {
        location.mode.allows_write(&self.write_key)
    }

    /// Fails if this context may not use `location`'s read APIs.
    pub fn check_read(&self, location: &Location) -> Result<(), AccessError> {
        if self.can_read(location) {
            Ok(())
        } else {
            Err(AccessError::new(&location.name, AccessKind::Read))
        }
    }

    /// Fails if this context may not use `location`'s write APIs.
    pub fn check_write(&self, location: &Location) -> Result<(), AccessError> {
        if self.can_write(location) {
            Ok(())
        } else {
            Err(AccessError::new(&location.name, AccessKind::Write))
        }
    }

    // Privilege

    /// Grants privilege for `region`, replacing any active grant.
    pub fn grant_privilege(&self, region: &str) -> PrivilegeGrant {
        self.state.write().privilege.grant(region)
    }

    /// Clears the active grant, whatever it is.
    pub fn revoke_privilege(&self) {
        self.state.write().privilege.revoke();
    }

    /// Clears the active grant only if it is `grant`.
    pub fn revoke_grant(&self, grant: &PrivilegeGrant) -> Result<(), PrivilegeError> {
        self.state.write().privilege.revoke_grant(grant)
    }

    /// Returns true if `region` holds the active grant.
    #[must_use]
    pub fn is_privileged(&self, region: &str) -> bool {
        self.state.read().privilege.is_privileged(region)
    }

    /// Returns true if `grant` is still the active grant.
    #[must_use]
    pub fn holds_privilege(&self, grant: &PrivilegeGrant) -> bool {
        self.state.read().privilege.holds(grant)
    }

    /// The region of the active grant, if any.
    #[must_use]
    pub fn privileged_region(&self) -> Option<String> {
        self.state.read().privilege.region().map(String::from)
    }

    /// Runs `f` with `region` privileged, revoking afterwards.
    ///
    /// If `f` replaced the grant, the replacement is left in place. The
    /// grant is revoked even if `f` panics.
    pub fn with_privilege<R>(&self, region: &str, f: impl FnOnce(&Self) -> R) -> R {
        let _scoped = ScopedGrant {
            ctx: self,
            grant: self.grant_privilege(region),
        };
        f(self)
    }

    // Logging

    /// The verbosity threshold for [`Context::record`].
    #[must_use]
    pub fn verbosity(&self) -> LogLevel {
        self.verbosity
    }

    /// Sets the verbosity. Only the owner may do this, before sharing.
    pub fn set_verbosity(&mut self, verbosity: LogLevel) {
        self.verbosity = verbosity;
    }

    /// The minimum level forwarded to the accumulator.
    #[must_use]
    pub fn accumulator_level(&self) -> LogLevel {
        self.log_accumulator_level
    }

    /// Sends a log call to the attached logger, or the default one.
    pub fn log(&self, level: LogLevel, op: &str, args: &[serde_json::Value]) {
        match &self.logger {
            Some(logger) => logger.log(level, op, args),
            None => default_logger().log(level, op, args),
        }
    }

    /// Emits a structured record.
    ///
    /// Records below the verbosity are dropped. Others go to the log hook,
    /// to the accumulator if at or above its level, and then to
    /// [`Context::log`].
    pub fn record(&self, level: LogLevel, op: &str, args: &[serde_json::Value]) {
        if !level.passes(self.verbosity) {
            return;
        }
        let record = LogRecord::new(level, op, self.id.as_str(), args.to_vec())
            .with_metadata(self.log_props());

        if let Some(hook) = &self.log_hook {
            hook.on_log(&record);
        }
        if let Some(acc) = &self.log_accumulator {
            if level.passes(self.log_accumulator_level) {
                acc.add(record);
            }
        }
        self.log(level, op, args);
    }

    /// Reports an instrumentation point to the point hook, if any.
    pub fn point(&self, point: &str, args: &[serde_json::Value]) {
        if let Some(hook) = &self.point_hook {
            hook.on_point(self, point, args);
        }
    }

    // Collaborators

    /// The attached logger, if any.
    #[must_use]
    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    /// The attached accumulator, if any.
    #[must_use]
    pub fn accumulator(&self) -> Option<&Arc<Accumulator>> {
        self.log_accumulator.as_ref()
    }

    /// The attached log hook, if any.
    #[must_use]
    pub fn log_hook(&self) -> Option<&Arc<dyn LogHook>> {
        self.log_hook.as_ref()
    }

    /// The attached point hook, if any.
    #[must_use]
    pub fn point_hook(&self) -> Option<&Arc<dyn PointHook>> {
        self.point_hook.as_ref()
    }

    /// The attached app, if any.
    #[must_use]
    pub fn app(&self) -> Option<&Arc<dyn App>> {
        self.app.as_ref()
    }

    /// The attached tracer, if any.
    #[must_use]
    pub fn tracer(&self) -> Option<&Arc<dyn Tracer>> {
        self.tracer.as_ref()
    }

    /// The cancellation token. The context never acts on it.
    #[must_use]
    pub fn cancellation(&self) -> &Arc<CancellationToken> {
        &self.cancellation
    }

    /// Headers from the app, or none without one.
    #[must_use]
    pub fn generate_headers(&self) -> HashMap<String, String> {
        self.app
            .as_ref()
            .map(|app| app.generate_headers(self))
            .unwrap_or_default()
    }

    /// Bindings rewritten by the app, or unchanged without one.
    #[must_use]
    pub fn process_bindings(&self, bindings: Bindings) -> Bindings {
        match &self.app {
            Some(app) => app.process_bindings(self, bindings),
            None => bindings,
        }
    }
}

/// Revokes a grant made by [`Context::with_privilege`] on drop.
struct ScopedGrant<'a> {
    ctx: &'a Context,
    grant: PrivilegeGrant,
}

impl Drop for ScopedGrant<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.revoke_grant(&self.grant) {
            tracing::debug!(context = %self.ctx.id, error = %e, "privilege replaced during scoped grant");
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("verbosity", &self.verbosity)
            .field("location", &self.location)
            .field("has_logger", &self.logger.is_some())
            .field("has_tracer", &self.tracer.is_some())
            .field("has_app", &self.app.is_some())
            .field("has_accumulator", &self.log_accumulator.is_some())
            .finish_non_exhaustive()
    }
}
