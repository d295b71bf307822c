//! Cooperative cancellation for long-running operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheap, cloneable handle a caller can use to request that a long-running
/// operation (pack indexing, rename detection) stop at its next natural
/// checkpoint.
///
/// Checked, not polled: the operation itself decides where "natural
/// boundaries" are (per-object for pack ingest, per-candidate-pair for
/// rename) and calls [`is_cancelled`](Self::is_cancelled) there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a new, not-yet-cancelled token.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
