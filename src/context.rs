//! Cancellation shared between the poll loop and the SIGINT handler.

use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the context, waking anything blocked in `wait_timeout`.
    pub fn cancel(&self) {
        *self.inner.lock() = true;
        self.inner.cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.lock()
    }

    /// Sleep for `duration` or until cancelled, whichever comes first.
    /// Returns true if the context has been cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let g = self.inner.lock();
        let (g, _) = self
            .inner
            .cv
            .wait_timeout_while(g, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *g
    }
}
