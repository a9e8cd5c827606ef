//! Cancellation for in-flight retry loops.
//!
//! A [`CancelToken`] is a sticky flag shared between a caller and the
//! orchestrator. Cancelling during a backoff wait aborts the wait
//! immediately — a condvar wakeup on the blocking side, a `Notify` on the
//! async side — and the loop surfaces
//! [`ClientError::Interrupted`](crate::ClientError::Interrupted) instead of
//! silently continuing. The flag never resets.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::error::{ClientError, ClientResult};

/// Shared cancellation signal. Cloning hands out another handle to the
/// same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
    notify: Notify,
}

impl CancelToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the operation. Idempotent; wakes every current waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);

        // Take the lock so a blocking waiter cannot miss the wakeup
        // between its flag check and its condvar wait.
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.condvar.notify_all();
        drop(guard);

        self.inner.notify.notify_waiters();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block the calling thread for `delay`, or until cancelled.
    pub(crate) fn sleep_blocking(&self, delay: Duration) -> ClientResult<()> {
        let deadline = Instant::now() + delay;
        let mut guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if self.is_cancelled() {
                return Err(ClientError::Interrupted);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            let (next, _timed_out) = self
                .inner
                .condvar
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            guard = next;
        }
    }

    /// Wait for `delay` without holding a thread, or until cancelled.
    pub(crate) async fn sleep_async(&self, delay: Duration) -> ClientResult<()> {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before re-checking the flag so a cancel
        // between the check and the await cannot be missed.
        notified.as_mut().enable();

        if self.is_cancelled() {
            return Err(ClientError::Interrupted);
        }

        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            () = &mut notified => Err(ClientError::Interrupted),
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken").field("cancelled", &self.is_cancelled()).finish()
    }
}
