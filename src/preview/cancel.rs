//! Per-load cancellation tokens

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Marker issued for one load attempt
///
/// Clones share the same flag. The pane cancels the token of the attempt it
/// supersedes; anything still holding a clone sees the cancellation both
/// synchronously ([`is_cancelled`](Self::is_cancelled)) and as an awaitable
/// signal ([`cancelled`](Self::cancelled)).
#[derive(Debug, Clone)]
pub struct LoadToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl LoadToken {
    #[must_use]
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Attempt number this token was issued for
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Whether `other` was issued for the same attempt
    #[must_use]
    pub fn same_attempt(&self, other: &Self) -> bool {
        self.generation == other.generation && Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}
