use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use super::{TickFn, Timer, TimerHandle};
use crate::error::DeviceError;

/// Timer backed by a dedicated, named OS thread.
///
/// The thread sleeps on a condition variable until the deadline, so
/// cancellation wakes it immediately instead of waiting out the period.
#[derive(Debug, Clone)]
pub struct ThreadTimer {
    name: String,
}

impl ThreadTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new("simtemp-generator")
    }
}

/// Deadlines past what `Instant` can represent are capped at a year out.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .unwrap_or_else(|| now + Duration::from_secs(365 * 24 * 60 * 60))
}

#[derive(Default)]
struct Control {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl Timer for ThreadTimer {
    fn schedule(&self, first: Duration, mut tick: TickFn) -> Result<TimerHandle, DeviceError> {
        let control = Arc::new(Control::default());
        let worker = Arc::clone(&control);

        let worker_thread = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let mut deadline = deadline_after(first);
                let mut cancelled = worker.cancelled.lock();
                while !*cancelled {
                    if worker.wake.wait_until(&mut cancelled, deadline).timed_out() && !*cancelled
                    {
                        // Tick without the control lock so cancel() never waits on it.
                        let next = MutexGuard::unlocked(&mut cancelled, || tick());
                        deadline = deadline_after(next);
                    }
                }
            })?;

        let first_ms = u64::try_from(first.as_millis()).unwrap_or(u64::MAX);
        debug!(timer = %self.name, first_ms, "Timer armed");

        Ok(TimerHandle::new(move || {
            *control.cancelled.lock() = true;
            control.wake.notify_all();
            if worker_thread.thread().id() != thread::current().id() {
                let _ = worker_thread.join();
            }
        }))
    }
}
