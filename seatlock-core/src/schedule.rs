//! Delayed-callback primitive used for lock expiry.
//!
//! A [`Scheduler`] runs a callback once after a delay and hands back a
//! [`TimerHandle`] that can cancel it. Cancellation is best-effort: a callback
//! that is already running, or has already run, is not affected, so callers
//! must make their callbacks safe to fire late.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{CoreError, CoreResult};

pub type ExpiryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Implementations must never run `callback` on the calling thread before
/// `schedule` returns: callers may hold a lock the callback also takes.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, callback: ExpiryCallback) -> TimerHandle;
}

/// Cancellation handle for a scheduled callback. Dropping it leaves the
/// callback scheduled.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Runs each callback on its own tokio task after `tokio::time::sleep`.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Binds to the runtime of the calling context.
    pub fn current() -> CoreResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| CoreError::SchedulerUnavailable(e.to_string()))?;
        Ok(Self::new(runtime))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: ExpiryCallback) -> TimerHandle {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        TimerHandle::new(move || task.abort())
    }
}
