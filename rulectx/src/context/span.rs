//! Span boundaries built on forking and the tracer collaborator.

use super::Context;
use std::ops::Deref;

/// Application tracing hooks.
///
/// One tracer is shared by a context and all its descendants and may be
/// called concurrently for independent span pairs.
pub trait Tracer: Send + Sync {
    /// Called with a freshly forked context and the operation it is for.
    ///
    /// The tracer may attach whatever span data it needs to `ctx`; that
    /// data is what child spans and [`Tracer::stop_span`] will see.
    fn start_span(&self, ctx: &mut Context, op_name: &str);

    /// Finalizes the span for a context previously given to `start_span`.
    fn stop_span(&self, ctx: &Context);
}

impl Context {
    /// Forks this context and opens a span on the child.
    ///
    /// Without a tracer this is just [`Context::fork`].
    #[must_use]
    pub fn start_span(&self, op_name: &str) -> Self {
        let mut child = self.fork();
        if let Some(tracer) = self.tracer() {
            tracer.start_span(&mut child, op_name);
        }
        child
    }

    /// Closes the span opened for this context.
    ///
    /// Must be called on the exact context returned by the matching
    /// [`Context::start_span`]; mismatched pairs are not detected.
    pub fn stop_span(&self) {
        if let Some(tracer) = self.tracer() {
            tracer.stop_span(self);
        }
    }

    /// Opens a span that closes when the returned guard is dropped.
    pub fn span(&self, op_name: &str) -> SpanGuard {
        SpanGuard {
            ctx: self.start_span(op_name),
        }
    }
}

/// A span context that calls [`Context::stop_span`] when dropped.
#[derive(Debug)]
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct SpanGuard {
    ctx: Context,
}

impl SpanGuard {
    /// The span's context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl Deref for SpanGuard {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.ctx.stop_span();
    }
}
