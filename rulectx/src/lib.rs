//! # rulectx
//!
//! Request-scoped, thread-safe contexts for rule evaluation and action
//! dispatch pipelines.
//!
//! A [`Context`](context::Context) carries identity, access keys, logging
//! and tracing hooks and arbitrary properties through a pipeline of
//! concurrently executing operations:
//!
//! - **Forking**: children share collaborators but own their properties
//! - **Location slot**: lock-free reads of the current location
//! - **Privilege marker**: single-slot re-entry grants for trusted hooks
//! - **Spans**: fork-plus-tracer boundaries around sub-operations
//!
//! ## Quick Start
//!
//! ```rust
//! use rulectx::prelude::*;
//! use std::sync::Arc;
//!
//! let root = Context::builder("rules")
//!     .with_tracer(Arc::new(TracingTracer::new()))
//!     .build();
//! root.add_prop("request", serde_json::json!("r-1"));
//!
//! let span = root.start_span("evaluate");
//! assert_eq!(span.prop("request"), Some(serde_json::json!("r-1")));
//! span.add_prop("matched", serde_json::json!(true));
//! span.stop_span();
//!
//! assert!(root.prop("matched").is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod logging;
pub mod observability;
pub mod ports;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::ContextConfig;
    pub use crate::context::{
        Context, ContextBuilder, Location, LocationMode, PrivilegeGrant, SpanGuard, Tracer,
    };
    pub use crate::errors::{AccessError, ConfigError, PrivilegeError, RulectxError};
    pub use crate::logging::{
        Accumulator, BenchLogger, LogHook, LogLevel, LogRecord, Logger, PointHook, TracingLogger,
    };
    pub use crate::observability::{init_logging, LoggingConfig, TracingTracer};
    pub use crate::ports::{App, Bindings, ScriptRuntime};
}
