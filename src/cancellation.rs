//! Cooperative cancellation signal shared across parallel phases and
//! long-running callback invocations. Separate from the
//! Orchestrator's own `merge_cb` cancellation path (a `None` return),
//! which is the primary, user-facing way a merge session gets cancelled;
//! this token exists for aborting an in-progress parallel scan (hashing,
//! walking) before it dispatches further work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
