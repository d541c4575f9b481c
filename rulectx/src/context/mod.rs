//! Request-scoped contexts for pipeline execution.
//!
//! This module provides:
//! - The `Context` type with forking, properties and logging metadata
//! - A lock-free slot for the current location
//! - The single-slot privilege marker
//! - Span boundaries on top of forking and the tracer collaborator
//! - Task-local propagation for async pipelines

mod builder;
#[cfg(test)]
mod context_tests;
mod execution;
mod location;
mod privilege;
mod scope;
mod span;
mod state;

pub use builder::ContextBuilder;
pub use execution::Context;
pub use location::{Location, LocationMode, LocationSlot};
pub use privilege::PrivilegeGrant;
pub use scope::{current, scope, sync_scope};
pub use span::{SpanGuard, Tracer};
pub use state::PropertyMap;
