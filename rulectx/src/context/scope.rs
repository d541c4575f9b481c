//! Ambient context for async tasks.
//!
//! Code deep inside a pipeline stage can reach the context the stage runs
//! under without threading it through every call.

use super::Context;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static CURRENT: Arc<Context>;
}

/// Runs `fut` with `ctx` as the current context.
pub async fn scope<F>(ctx: Arc<Context>, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, fut).await
}

/// Runs `f` with `ctx` as the current context.
pub fn sync_scope<R>(ctx: Arc<Context>, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(ctx, f)
}

/// Returns the current context, if running inside [`scope`].
#[must_use]
pub fn current() -> Option<Arc<Context>> {
    CURRENT.try_with(Arc::clone).ok()
}
