use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Notification fired when a timed vibration finishes
///
/// Shared so the same callback can be handed to the scheduler more than once.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Identifies one scheduled completion callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionToken(u64);

type PendingMap = Arc<Mutex<HashMap<u64, AbortHandle>>>;

/// Runs completion callbacks after a delay
///
/// Each callback runs at most once: either its delay elapses and it fires, or
/// it is cancelled first. Callbacks are independent Tokio tasks, so they keep
/// running across reconnects of the controller that scheduled them.
pub struct CallbackScheduler {
    next_id: AtomicU64,
    pending: PendingMap,
}

impl CallbackScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `callback` once `delay` has elapsed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, delay: Duration, callback: CompletionCallback) -> CompletionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = self.pending.clone();

        // Hold the lock across spawn so a zero delay can't fire before the
        // abort handle is registered.
        let mut guard = lock(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = lock(&pending).remove(&id).is_some();
            if still_pending {
                tracing::debug!("Firing completion callback {} after {:?}", id, delay);
                callback();
            }
        });
        guard.insert(id, handle.abort_handle());
        drop(guard);

        tracing::debug!("Scheduled completion callback {} in {:?}", id, delay);
        CompletionToken(id)
    }

    /// Cancel a scheduled callback
    ///
    /// Returns `false` if the callback already fired or was cancelled before.
    pub fn cancel(&self, token: CompletionToken) -> bool {
        match lock(&self.pending).remove(&token.0) {
            Some(handle) => {
                handle.abort();
                tracing::debug!("Cancelled completion callback {}", token.0);
                true
            }
            None => false,
        }
    }

    /// Number of callbacks that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Default for CallbackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallbackScheduler {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.pending).drain() {
            handle.abort();
        }
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
