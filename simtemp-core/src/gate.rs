//! Notification gate: how the `sample_available` false→true transition
//! reaches waiters.
//!
//! Blocking readers park on a condition variable tied to the device lock.
//! Async pollers leave a [`Waker`]. Both registration and wake-up happen
//! with the device lock held, so a commit can never slip in between a
//! waiter's check and its sleep.

use std::mem;
use std::task::Waker;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};

pub(crate) struct NotificationGate {
    readers: Condvar,
    // Only locked while the device lock is held.
    wakers: Mutex<Vec<Waker>>,
}

impl NotificationGate {
    pub(crate) fn new() -> Self {
        Self {
            readers: Condvar::new(),
            wakers: Mutex::new(Vec::new()),
        }
    }

    /// Parks the caller until notified or `deadline` passes. Returns `true` on
    /// timeout.
    pub(crate) fn wait_until<T>(&self, guard: &mut MutexGuard<'_, T>, deadline: Instant) -> bool {
        self.readers.wait_until(guard, deadline).timed_out()
    }

    pub(crate) fn register(&self, waker: &Waker) {
        let mut wakers = self.wakers.lock();
        if !wakers.iter().any(|known| known.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }

    /// Wakes every blocked reader and hands back the registered async wakers.
    /// Callers wake those after dropping the device lock.
    #[must_use]
    pub(crate) fn notify_all(&self) -> Vec<Waker> {
        self.readers.notify_all();
        mem::take(&mut *self.wakers.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;
    use std::time::Duration;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn duplicate_wakers_are_registered_once() {
        let gate = NotificationGate::new();
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));

        gate.register(&waker);
        gate.register(&waker);
        for waker in gate.notify_all() {
            waker.wake();
        }

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(gate.notify_all().is_empty());
    }

    #[test]
    fn wait_times_out_without_notification() {
        let gate = NotificationGate::new();
        let lock = Mutex::new(());
        let mut guard = lock.lock();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert!(gate.wait_until(&mut guard, deadline));
    }
}
