//! Cancellation signal carried opaquely by contexts.

mod token;

pub use token::{CancelCallback, CancellationToken};
