use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{TickFn, Timer, TimerHandle};
use crate::error::DeviceError;

/// Deterministic timer: ticks run only when [`ManualTimer::fire`] is called,
/// on the caller's thread. Clones control the same schedule.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    /// Schedule currently armed, if any.
    armed: Option<u64>,
    next_id: u64,
    tick: Option<TickFn>,
    next_delay: Option<Duration>,
    fired: u64,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed.is_some()
    }

    /// Delay requested by the last schedule or tick.
    pub fn next_delay(&self) -> Option<Duration> {
        self.inner.lock().next_delay
    }

    /// Total ticks run across all schedules.
    pub fn fired(&self) -> u64 {
        self.inner.lock().fired
    }

    /// Runs the armed tick once. Returns `false` when nothing is armed.
    pub fn fire(&self) -> bool {
        let (id, mut tick) = {
            let mut state = self.inner.lock();
            match (state.armed, state.tick.take()) {
                (Some(id), Some(tick)) => (id, tick),
                _ => return false,
            }
        };

        let next = tick();

        let mut state = self.inner.lock();
        state.fired += 1;
        if state.armed == Some(id) {
            state.tick = Some(tick);
            state.next_delay = Some(next);
        }
        true
    }

    /// Fires up to `n` times, returning how many ticks actually ran.
    pub fn fire_n(&self, n: usize) -> usize {
        (0..n).take_while(|_| self.fire()).count()
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, first: Duration, tick: TickFn) -> Result<TimerHandle, DeviceError> {
        let id = {
            let mut state = self.inner.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.armed = Some(id);
            state.tick = Some(tick);
            state.next_delay = Some(first);
            id
        };

        let inner = Arc::clone(&self.inner);
        Ok(TimerHandle::new(move || {
            let mut state = inner.lock();
            if state.armed == Some(id) {
                state.armed = None;
                state.tick = None;
                state.next_delay = None;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_tick(count: &Arc<AtomicU32>, delay: Duration) -> TickFn {
        let count = Arc::clone(count);
        Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
            delay
        })
    }

    #[test]
    fn fires_only_on_demand() {
        let timer = ManualTimer::new();
        let count = Arc::new(AtomicU32::new(0));
        let _handle = timer
            .schedule(
                Duration::from_millis(10),
                counting_tick(&count, Duration::from_millis(20)),
            )
            .unwrap();

        assert_eq!(timer.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(timer.fire_n(3), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn cancelled_schedule_no_longer_fires() {
        let timer = ManualTimer::new();
        let count = Arc::new(AtomicU32::new(0));
        let handle = timer
            .schedule(Duration::ZERO, counting_tick(&count, Duration::ZERO))
            .unwrap();
        handle.cancel();

        assert!(!timer.is_armed());
        assert!(!timer.fire());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stale_handle_leaves_newer_schedule_armed() {
        let timer = ManualTimer::new();
        let count = Arc::new(AtomicU32::new(0));
        let old = timer
            .schedule(Duration::ZERO, counting_tick(&count, Duration::ZERO))
            .unwrap();
        let _new = timer
            .schedule(Duration::ZERO, counting_tick(&count, Duration::ZERO))
            .unwrap();
        drop(old);

        assert!(timer.is_armed());
        assert!(timer.fire());
    }
}
