//! ## simtemp-core::timer
//! **Re-arming timers that drive the generator**
//!
//! A scheduled tick runs once after the initial delay; whatever duration it
//! returns is the delay until the next run. Dropping or cancelling the
//! returned [`TimerHandle`] stops the cycle.
//!
//! ### Implementations:
//! - `ThreadTimer`: one dedicated OS thread per schedule
//! - `ManualTimer`: fires only when the owner calls `fire()`

use std::time::Duration;

use crate::error::DeviceError;

mod manual;
mod thread;

pub use manual::ManualTimer;
pub use thread::ThreadTimer;

/// Tick callback. Returns the delay until it should run again.
pub type TickFn = Box<dyn FnMut() -> Duration + Send + 'static>;

/// Periodic timer primitive: schedule, re-arm, cancel.
pub trait Timer: Send + Sync {
    /// Runs `tick` after `first`, then after every delay it returns.
    ///
    /// Fails only when the timer cannot acquire the resources it needs.
    fn schedule(&self, first: Duration, tick: TickFn) -> Result<TimerHandle, DeviceError>;
}

/// Cancels the schedule it came from, on [`TimerHandle::cancel`] or drop.
///
/// Once cancellation returns, the tick is not running and never runs again.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn drop_runs_cancellation_once() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = TimerHandle::new(move || {
            assert!(!flag.swap(true, Ordering::SeqCst));
        });
        drop(handle);
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
