//! Cancellation token carried by contexts.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// A cooperative cancellation signal with an optional deadline.
///
/// Contexts carry a token through forking without interpreting it; whatever
/// drives the pipeline decides what cancellation or an expired deadline
/// means. Only the first cancellation reason is kept. Child tokens are
/// cancelled together with their parent.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
    deadline: Option<DateTime<Utc>>,
    callbacks: RwLock<Vec<CancelCallback>>,
    children: RwLock<Vec<Weak<CancellationToken>>>,
}

impl CancellationToken {
    /// Creates a token without a deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that reports expiry after `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: DateTime<Utc>) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// Creates a child token that inherits the deadline.
    ///
    /// Cancelling the parent cancels the child; not the other way round.
    #[must_use]
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        let child = Arc::new(Self {
            deadline: self.deadline,
            ..Self::default()
        });
        let mut children = self.children.write();
        if self.is_cancelled() {
            drop(children);
            child.cancel(self.reason().unwrap_or_default());
        } else {
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        child
    }

    /// Requests cancellation. Callbacks run once; panics in them are logged.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let (callbacks, children) = {
            // The flag flips while both lists are locked, so a concurrent
            // `child` or `on_cancel` either registers before the drain or
            // sees the flag.
            let mut callbacks = self.callbacks.write();
            let mut children = self.children.write();
            if self
                .cancelled
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            *self.reason.write() = Some(reason.clone());
            (std::mem::take(&mut *callbacks), std::mem::take(&mut *children))
        };

        for callback in &callbacks {
            run_callback(callback.as_ref());
        }
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel(reason.clone());
        }
    }

    /// Registers a callback, running it now if already cancelled.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write();
        if self.is_cancelled() {
            drop(callbacks);
            run_callback(&callback);
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    #[cfg(test)]
    fn child_entries(&self) -> usize {
        self.children.read().len()
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Utc::now() >= deadline)
    }

    /// Returns true if cancelled or past the deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }
}

fn run_callback(callback: &(dyn Fn() + Send + Sync)) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .field("deadline", &self.deadline)
            .finish()
    }
}
