//! Error types for rulectx.
//!
//! The context core itself degrades gracefully instead of failing: missing
//! collaborators fall back to defaults and missing keys read as `None`.
//! These types cover the surfaces that can be refused: location access
//! checks, privilege revocation and configuration.

use thiserror::Error;

/// The main error type for rulectx operations.
#[derive(Debug, Error)]
pub enum RulectxError {
    /// A location refused access for the context's keys.
    #[error("{0}")]
    Access(#[from] AccessError),

    /// A privilege grant could not be applied.
    #[error("{0}")]
    Privilege(#[from] PrivilegeError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Kind of access checked against a location's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// A read API.
    Read,
    /// A write API.
    Write,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Raised when a context's key does not match the key a location requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} access to location '{location}' denied: key mismatch")]
pub struct AccessError {
    /// The location that refused access.
    pub location: String,
    /// Which key was checked.
    pub kind: AccessKind,
}

impl AccessError {
    /// Creates a new access error.
    #[must_use]
    pub fn new(location: impl Into<String>, kind: AccessKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }
}

/// Raised when a privilege grant is no longer the active one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivilegeError {
    /// Another grant replaced this one, or it was already revoked.
    #[error("privilege grant for region '{region}' is no longer active")]
    Stale {
        /// Region named by the stale grant.
        region: String,
    },
}

/// Raised when configuration is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A log level name was not recognized.
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    /// A configuration value could not be parsed.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// What was wrong.
        message: String,
    },

    /// A JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// The global tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
