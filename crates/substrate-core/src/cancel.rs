//! Cooperative cancellation (spec.md §5).
//!
//! Ingest and walk loops check a [`CancellationToken`] every
//! `config.check_interval` items/steps. There is no timeout in the core
//! itself; callers build timeouts by cancelling from another thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheap, cloneable flag checked cooperatively by long-running loops.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, non-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Observers see this on their next check.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Returns true once every `interval` calls (tracked via `counter`), used
/// to gate cancellation checks in hot loops without paying an atomic load
/// on every single item.
#[must_use]
pub fn should_check(counter: usize, interval: usize) -> bool {
    interval > 0 && counter % interval == 0
}
