//! Configuration for building root contexts.

use crate::context::{Context, ContextBuilder};
use crate::errors::ConfigError;
use crate::logging::{Accumulator, LogLevel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Environment variable prefix read by [`ContextConfig::from_env`].
pub const ENV_PREFIX: &str = "RULECTX_";

/// Settings applied to every root context built from this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Application id recorded in each context's logging metadata.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Verbosity threshold.
    #[serde(default = "default_verbosity")]
    pub verbosity: LogLevel,
    /// Minimum level forwarded to the accumulator.
    #[serde(default = "default_accumulator_level")]
    pub accumulator_level: LogLevel,
    /// Attach an accumulator holding at most this many records.
    #[serde(default)]
    pub accumulator_limit: Option<usize>,
    /// Read key presented to locations.
    #[serde(default)]
    pub read_key: String,
    /// Write key presented to locations.
    #[serde(default)]
    pub write_key: String,
}

fn default_app_id() -> String {
    "rulectx".to_string()
}

fn default_verbosity() -> LogLevel {
    LogLevel::DEFAULT_VERBOSITY
}

fn default_accumulator_level() -> LogLevel {
    LogLevel::ANY_WARN
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            verbosity: default_verbosity(),
            accumulator_level: default_accumulator_level(),
            accumulator_limit: None,
            read_key: String::new(),
            write_key: String::new(),
        }
    }
}

impl ContextConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application id.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Sets the verbosity.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: LogLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads `RULECTX_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, starting from the defaults.
    ///
    /// Keys are the `RULECTX_`-prefixed names: `APP_ID`, `VERBOSITY`,
    /// `ACCUMULATOR_LEVEL`, `ACCUMULATOR_LIMIT`, `READ_KEY`, `WRITE_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(app_id) = get("APP_ID") {
            config.app_id = app_id;
        }
        if let Some(level) = get("VERBOSITY") {
            config.verbosity = level.parse()?;
        }
        if let Some(level) = get("ACCUMULATOR_LEVEL") {
            config.accumulator_level = level.parse()?;
        }
        if let Some(limit) = get("ACCUMULATOR_LIMIT") {
            let limit = limit.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: format!("{ENV_PREFIX}ACCUMULATOR_LIMIT"),
                    message: e.to_string(),
                }
            })?;
            config.accumulator_limit = Some(limit);
        }
        if let Some(key) = get("READ_KEY") {
            config.read_key = key;
        }
        if let Some(key) = get("WRITE_KEY") {
            config.write_key = key;
        }
        Ok(config)
    }

    /// A builder preloaded with these settings.
    ///
    /// A fresh accumulator is attached when a limit is configured.
    pub fn into_builder(self) -> ContextBuilder {
        let mut builder = Context::builder(self.app_id)
            .with_verbosity(self.verbosity)
            .with_accumulator_level(self.accumulator_level)
            .with_read_key(self.read_key)
            .with_write_key(self.write_key);
        if let Some(limit) = self.accumulator_limit {
            builder = builder.with_accumulator(Arc::new(Accumulator::new(limit)));
        }
        builder
    }

    /// Builds a root context with these settings.
    #[must_use]
    pub fn build_context(&self) -> Context {
        self.clone().into_builder().build()
    }
}
