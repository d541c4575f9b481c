//! A [`Tracer`] that reports spans through the `tracing` ecosystem.

use crate::context::{Context, Tracer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Logging metadata key holding the span id.
pub const SPAN_ID_KEY: &str = "spanId";
/// Logging metadata key holding the enclosing span id.
pub const PARENT_SPAN_ID_KEY: &str = "parentSpanId";
/// Logging metadata key holding the span's operation name.
pub const SPAN_OP_KEY: &str = "spanOp";
/// Logging metadata key holding the span start time (RFC 3339).
pub const SPAN_STARTED_AT_KEY: &str = "spanStartedAt";

/// Span data read back from a context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanAttributes {
    /// Context the span belongs to.
    pub context_id: String,
    /// Span id.
    pub span_id: Option<String>,
    /// Enclosing span id.
    pub parent_span_id: Option<String>,
    /// Operation name.
    pub op_name: Option<String>,
    /// Application id.
    pub app_id: Option<String>,
}

impl SpanAttributes {
    /// Reads span attributes from `ctx`'s logging metadata.
    #[must_use]
    pub fn from_context(ctx: &Context) -> Self {
        let meta = ctx.log_props();
        let text = |key: &str| meta.get(key).and_then(|v| v.as_str()).map(String::from);
        Self {
            context_id: ctx.id().to_string(),
            span_id: text(SPAN_ID_KEY),
            parent_span_id: text(PARENT_SPAN_ID_KEY),
            op_name: text(SPAN_OP_KEY),
            app_id: text("appId"),
        }
    }

    /// Converts to OpenTelemetry-style attribute names.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("context.id".to_string(), self.context_id.clone());

        if let Some(ref v) = self.span_id {
            attrs.insert("span.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.parent_span_id {
            attrs.insert("span.parent_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.op_name {
            attrs.insert("span.op".to_string(), v.clone());
        }
        if let Some(ref v) = self.app_id {
            attrs.insert("service.name".to_string(), v.clone());
        }
        attrs
    }
}

/// Tracer that stamps span ids into contexts and logs span boundaries.
///
/// Each started span gets a fresh id; the id found on the forked context
/// (inherited from its parent) becomes the parent span id.
#[derive(Debug, Clone, Default)]
pub struct TracingTracer;

impl TracingTracer {
    /// Creates a tracer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, ctx: &mut Context, op_name: &str) {
        let span_id = Uuid::new_v4().to_string();
        if let Some(parent) = ctx.log_value(SPAN_ID_KEY) {
            ctx.set_log_value(PARENT_SPAN_ID_KEY, parent);
        }
        ctx.set_log_value(SPAN_ID_KEY, serde_json::json!(span_id));
        ctx.set_log_value(SPAN_OP_KEY, serde_json::json!(op_name));
        ctx.set_log_value(SPAN_STARTED_AT_KEY, serde_json::json!(Utc::now().to_rfc3339()));

        let attributes = SpanAttributes::from_context(ctx).to_otel_attributes();
        tracing::info!(span_id = %span_id, op = op_name, ?attributes, "Span started");
    }

    fn stop_span(&self, ctx: &Context) {
        let attrs = SpanAttributes::from_context(ctx);
        let duration_ms = span_duration_ms(ctx);
        tracing::info!(
            span_id = attrs.span_id.as_deref().unwrap_or_default(),
            op = attrs.op_name.as_deref().unwrap_or_default(),
            duration_ms,
            attributes = ?attrs.to_otel_attributes(),
            "Span ended"
        );
    }
}

/// Milliseconds since the span on `ctx` started, if it has a start time.
#[must_use]
pub fn span_duration_ms(ctx: &Context) -> Option<f64> {
    let started = ctx.log_value(SPAN_STARTED_AT_KEY)?;
    let started: DateTime<Utc> = DateTime::parse_from_rfc3339(started.as_str()?)
        .ok()?
        .with_timezone(&Utc);
    let elapsed = Utc::now().signed_duration_since(started);
    #[allow(clippy::cast_precision_loss)]
    Some(elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1000.0)
}
