//! Observability utilities.

mod subscriber;
mod tracing;

pub use subscriber::{init_logging, LoggingConfig};
pub use tracing::{
    span_duration_ms, SpanAttributes, TracingTracer, PARENT_SPAN_ID_KEY, SPAN_ID_KEY,
    SPAN_OP_KEY, SPAN_STARTED_AT_KEY,
};
