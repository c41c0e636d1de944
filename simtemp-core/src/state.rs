//! ## simtemp-core::state
//! **Shared device state behind a single lock**
//!
//! [`DeviceCell`] is the only way in. Generator, readers and configuration
//! all go through its methods, each of which holds the lock for one short,
//! non-suspending critical section (blocking reads release it while parked).
//! Splitting the lock or replacing it with a ring buffer only touches this
//! file.

use std::sync::Arc;
use std::task::Waker;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::device::{Readiness, Settings};
use crate::error::DeviceError;
use crate::gate::NotificationGate;
use crate::mode::Mode;
use crate::sample::Sample;
use crate::stats::Statistics;

/// Everything guarded by the device lock.
#[derive(Debug, Clone)]
pub(crate) struct DeviceState {
    pub(crate) sampling_ms: u32,
    pub(crate) threshold_mc: i32,
    pub(crate) mode: Mode,
    pub(crate) latest: Sample,
    pub(crate) sample_available: bool,
    pub(crate) stats: Statistics,
    /// Bumped on every commit; lets a woken reader tell a lost race from a
    /// spurious wake-up.
    pub(crate) generation: u64,
    pub(crate) running: bool,
}

impl DeviceState {
    fn new(settings: &Settings) -> Self {
        Self {
            sampling_ms: settings.sampling_ms,
            threshold_mc: settings.threshold_mc,
            mode: settings.mode,
            latest: Sample::initial(),
            sample_available: false,
            stats: Statistics::default(),
            generation: 0,
            running: false,
        }
    }

    fn readiness(&self) -> Readiness {
        Readiness {
            data_ready: self.sample_available,
            priority_ready: self.sample_available && self.latest.is_alert(),
        }
    }

    fn consume(&mut self) -> Sample {
        self.sample_available = false;
        self.latest
    }
}

/// Result of one generator tick, applied atomically by [`DeviceCell::commit`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Commit {
    pub(crate) sample: Sample,
    pub(crate) alert: bool,
    pub(crate) out_of_range: bool,
}

pub(crate) struct DeviceCell {
    state: Mutex<DeviceState>,
    gate: NotificationGate,
}

impl DeviceCell {
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            state: Mutex::new(DeviceState::new(settings)),
            gate: NotificationGate::new(),
        }
    }

    /// Replaces the state with fresh values and marks the device running.
    /// The commit generation carries over.
    pub(crate) fn reset(&self, settings: &Settings) {
        let mut state = self.state.lock();
        let generation = state.generation;
        *state = DeviceState::new(settings);
        state.generation = generation;
        state.running = true;
    }

    /// Marks the device stopped and wakes every waiter so it can observe that.
    pub(crate) fn shutdown(&self) {
        let wakers = {
            let mut state = self.state.lock();
            state.running = false;
            state.sample_available = false;
            self.gate.notify_all()
        };
        wakers.into_iter().for_each(Waker::wake);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Read access to a running device.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&DeviceState) -> R) -> Result<R, DeviceError> {
        let state = self.state.lock();
        if !state.running {
            return Err(DeviceError::NotReady);
        }
        Ok(f(&state))
    }

    /// Write access to a running device.
    pub(crate) fn update<R>(
        &self,
        f: impl FnOnce(&mut DeviceState) -> R,
    ) -> Result<R, DeviceError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(DeviceError::NotReady);
        }
        Ok(f(&mut state))
    }

    /// Publishes a new sample: overwrites the latest one, updates statistics,
    /// raises `sample_available` and wakes all waiters. Returns `false` if the
    /// device stopped in the meantime.
    pub(crate) fn commit(&self, commit: Commit) -> bool {
        let wakers = {
            let mut state = self.state.lock();
            if !state.running {
                return false;
            }
            state.stats.record_update();
            if commit.alert {
                state.stats.record_alert();
            }
            if commit.out_of_range {
                state.stats.record_error();
            }
            state.latest = commit.sample;
            state.sample_available = true;
            state.generation = state.generation.wrapping_add(1);
            self.gate.notify_all()
        };
        wakers.into_iter().for_each(Waker::wake);
        true
    }

    /// Takes the pending sample without waiting.
    pub(crate) fn try_take(&self) -> Result<Sample, DeviceError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(DeviceError::NotReady);
        }
        if state.sample_available {
            Ok(state.consume())
        } else {
            Err(DeviceError::WouldBlock)
        }
    }

    /// Takes the pending sample, parking until one is committed, `timeout`
    /// elapses, or `cancel` fires.
    ///
    /// A reader woken by a commit whose sample was already taken by someone
    /// else gets `TryAgain` instead of going back to sleep.
    pub(crate) fn wait_for_sample(
        self: &Arc<Self>,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<Sample, DeviceError> {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + Duration::from_secs(365 * 24 * 3600));

        if let Some(token) = cancel {
            token.subscribe(self);
        }

        let mut state = self.state.lock();
        let seen = state.generation;
        let mut timed_out = false;
        loop {
            if !state.running {
                return Err(DeviceError::NotReady);
            }
            if state.sample_available {
                return Ok(state.consume());
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(DeviceError::Interrupted);
            }
            if state.generation != seen {
                return Err(DeviceError::TryAgain);
            }
            if timed_out {
                return Err(DeviceError::TimedOut);
            }
            timed_out = self.gate.wait_until(&mut state, deadline);
        }
    }

    pub(crate) fn readiness(&self) -> Result<Readiness, DeviceError> {
        self.read(DeviceState::readiness)
    }

    /// Registers `waker` for the next commit, then reports readiness. Both
    /// happen under the lock, so a commit after this call always wakes it.
    pub(crate) fn register_and_check(&self, waker: &Waker) -> Result<Readiness, DeviceError> {
        let state = self.state.lock();
        if !state.running {
            return Err(DeviceError::NotReady);
        }
        self.gate.register(waker);
        Ok(state.readiness())
    }

    /// Wakes blocked readers without changing state, so they re-check their
    /// cancellation tokens.
    pub(crate) fn wake_waiters(&self) {
        let wakers = {
            let _state = self.state.lock();
            self.gate.notify_all()
        };
        wakers.into_iter().for_each(Waker::wake);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleFlags;

    fn running_cell() -> Arc<DeviceCell> {
        let cell = Arc::new(DeviceCell::new(&Settings::default()));
        cell.reset(&Settings::default());
        cell
    }

    fn commit_of(temp_mc: i32, flags: SampleFlags) -> Commit {
        Commit {
            sample: Sample::new(1, temp_mc, SampleFlags::NEW | flags),
            alert: flags.contains(SampleFlags::THRESHOLD_HIGH),
            out_of_range: flags.contains(SampleFlags::OUT_OF_RANGE),
        }
    }

    #[test]
    fn stopped_cell_rejects_everything() {
        let cell = Arc::new(DeviceCell::new(&Settings::default()));
        assert!(matches!(cell.try_take(), Err(DeviceError::NotReady)));
        assert!(matches!(cell.readiness(), Err(DeviceError::NotReady)));
        assert!(!cell.commit(commit_of(1, SampleFlags::empty())));
    }

    #[test]
    fn commit_updates_stats_and_availability() {
        let cell = running_cell();
        assert!(cell.commit(commit_of(
            200_000,
            SampleFlags::THRESHOLD_HIGH | SampleFlags::OUT_OF_RANGE
        )));

        let stats = cell.read(|s| s.stats).unwrap();
        assert_eq!(
            stats,
            Statistics {
                updates: 1,
                alerts: 1,
                errors: 1
            }
        );
        assert_eq!(
            cell.readiness().unwrap(),
            Readiness {
                data_ready: true,
                priority_ready: true
            }
        );
    }

    #[test]
    fn a_sample_is_taken_once() {
        let cell = running_cell();
        cell.commit(commit_of(27_500, SampleFlags::empty()));
        assert_eq!(cell.try_take().unwrap().temp_mc(), 27_500);
        assert!(matches!(cell.try_take(), Err(DeviceError::WouldBlock)));
        assert!(!cell.readiness().unwrap().data_ready);
    }

    #[test]
    fn wait_returns_pending_sample_immediately() {
        let cell = running_cell();
        cell.commit(commit_of(1, SampleFlags::empty()));
        let sample = cell.wait_for_sample(Duration::from_millis(1), None).unwrap();
        assert_eq!(sample.temp_mc(), 1);
    }

    #[test]
    fn wait_times_out_when_nothing_arrives() {
        let cell = running_cell();
        let result = cell.wait_for_sample(Duration::from_millis(20), None);
        assert!(matches!(result, Err(DeviceError::TimedOut)));
    }

    #[test]
    fn already_cancelled_token_interrupts() {
        let cell = running_cell();
        let token = CancelToken::new();
        token.cancel();
        let result = cell.wait_for_sample(Duration::from_secs(5), Some(&token));
        assert!(matches!(result, Err(DeviceError::Interrupted)));
    }

    #[test]
    fn reset_restores_initial_values() {
        let cell = running_cell();
        cell.commit(commit_of(1, SampleFlags::empty()));
        cell.update(|s| s.threshold_mc = 0).unwrap();

        cell.reset(&Settings::default());
        let state = cell.read(DeviceState::clone).unwrap();
        assert_eq!(state.threshold_mc, 50_000);
        assert_eq!(state.stats, Statistics::default());
        assert_eq!(state.latest, Sample::initial());
        assert!(!state.sample_available);
    }

    #[test]
    fn reset_keeps_commit_generation() {
        let cell = running_cell();
        cell.commit(commit_of(1, SampleFlags::empty()));
        cell.commit(commit_of(2, SampleFlags::empty()));
        let before = cell.read(|s| s.generation).unwrap();
        assert!(before > 0);

        cell.reset(&Settings::default());
        assert_eq!(cell.read(|s| s.generation).unwrap(), before);
    }
}
