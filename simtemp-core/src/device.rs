//! ## simtemp-core::device
//! **Device lifecycle and consumer interface**
//!
//! [`SimTemp`] owns the shared cell, the generator schedule and the clock.
//! Instances are independent; nothing here is global.
//!
//! ### Consumer contract:
//! - `read` delivers each committed sample at most once
//! - `poll` / `poll_ready` report readiness without consuming
//! - every operation fails with `NotReady` while the device is stopped

use std::future::poll_fn;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::cancel::CancelToken;
use crate::error::DeviceError;
use crate::generator::Generator;
use crate::limits::{READ_TIMEOUT, SAMPLING_MS, THRESHOLD_MC};
use crate::mode::Mode;
use crate::sample::{Sample, SAMPLE_SIZE};
use crate::state::DeviceCell;
use crate::time::{Clock, MonotonicClock};
use crate::timer::{ThreadTimer, Timer, TimerHandle};

/// Values a device starts from. Every `start` resets to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub sampling_ms: u32,
    pub threshold_mc: i32,
    pub mode: Mode,
    /// Fixed RNG seed for reproducible noisy runs.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sampling_ms: SAMPLING_MS.default,
            threshold_mc: THRESHOLD_MC.default,
            mode: Mode::default(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), DeviceError> {
        SAMPLING_MS.check("sampling_ms", self.sampling_ms)?;
        THRESHOLD_MC.check("threshold_mc", self.threshold_mc)?;
        Ok(())
    }
}

/// How a single `read` behaves.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub blocking: bool,
    /// Overrides the default wait of [`READ_TIMEOUT`].
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl ReadOptions {
    pub fn blocking() -> Self {
        Self {
            blocking: true,
            ..Self::default()
        }
    }

    pub fn nonblocking() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(READ_TIMEOUT)
    }
}

/// Readiness snapshot returned by [`SimTemp::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    /// A sample is waiting to be read.
    pub data_ready: bool,
    /// The waiting sample crossed the alert threshold.
    pub priority_ready: bool,
}

/// A simulated temperature sensor.
pub struct SimTemp {
    pub(crate) cell: Arc<DeviceCell>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    handle: Mutex<Option<TimerHandle>>,
}

/// Swaps the timer or clock a [`SimTemp`] runs on.
#[derive(Default)]
pub struct SimTempBuilder {
    timer: Option<Arc<dyn Timer>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SimTempBuilder {
    pub fn timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Some(Arc::new(timer));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> SimTemp {
        let timer: Arc<dyn Timer> = match self.timer {
            Some(timer) => timer,
            None => Arc::new(ThreadTimer::default()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(MonotonicClock::new()),
        };
        SimTemp {
            cell: Arc::new(DeviceCell::new(&Settings::default())),
            timer,
            clock,
            handle: Mutex::new(None),
        }
    }
}

impl SimTemp {
    /// Device on a dedicated timer thread and the monotonic clock, not yet
    /// started.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SimTempBuilder {
        SimTempBuilder::default()
    }

    /// Resets all state to `settings` and arms the generator. The first
    /// sample is produced one period later. Restarting a running device
    /// cancels the old schedule first.
    pub fn start(&self, settings: Settings) -> Result<(), DeviceError> {
        settings.validate()?;

        let mut handle = self.handle.lock();
        if let Some(previous) = handle.take() {
            previous.cancel();
        }
        self.cell.reset(&settings);

        let rng = match settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let mut generator = Generator::new(Arc::clone(&self.cell), Arc::clone(&self.clock), rng);
        let period = Duration::from_millis(settings.sampling_ms.into());

        match self.timer.schedule(period, Box::new(move || generator.tick())) {
            Ok(armed) => {
                *handle = Some(armed);
                info!(
                    sampling_ms = settings.sampling_ms,
                    threshold_mc = settings.threshold_mc,
                    mode = %settings.mode,
                    "Device started"
                );
                Ok(())
            }
            Err(err) => {
                self.cell.shutdown();
                error!(%err, "Device failed to start");
                Err(err)
            }
        }
    }

    /// Cancels the generator and wakes all waiters, which then see
    /// `NotReady`. Stopping a stopped device is a no-op.
    pub fn stop(&self) {
        // Held until shutdown so a concurrent start cannot arm in between.
        let mut handle = self.handle.lock();
        let was_running = self.cell.is_running();
        if let Some(previous) = handle.take() {
            previous.cancel();
        }
        self.cell.shutdown();
        drop(handle);
        if was_running {
            info!("Device stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.cell.is_running()
    }

    /// Takes the latest sample.
    ///
    /// Non-blocking reads fail with `WouldBlock` when nothing is pending.
    /// Blocking reads wait up to the effective timeout and fail with
    /// `TimedOut`, `TryAgain` or `Interrupted`.
    pub fn read(&self, options: &ReadOptions) -> Result<Sample, DeviceError> {
        let result = if options.blocking {
            self.cell
                .wait_for_sample(options.effective_timeout(), options.cancel.as_ref())
        } else {
            self.cell.try_take()
        };
        if let Err(err) = &result {
            debug!(reason = err.name(), blocking = options.blocking, "Read returned no sample");
        }
        result
    }

    /// Byte-oriented read of one 16-byte record into `buf`.
    ///
    /// Any nonzero `offset` is end of data. A buffer shorter than one record
    /// is rejected before anything is consumed.
    pub fn read_at(
        &self,
        buf: &mut [u8],
        offset: u64,
        options: &ReadOptions,
    ) -> Result<usize, DeviceError> {
        if offset > 0 {
            return Ok(0);
        }
        if buf.len() < SAMPLE_SIZE {
            return Err(DeviceError::InvalidArgument(format!(
                "buffer of {} bytes, need {SAMPLE_SIZE}",
                buf.len()
            )));
        }
        self.read(options)?.write_to(buf)
    }

    /// Current readiness, without registering for wake-ups.
    pub fn poll(&self) -> Result<Readiness, DeviceError> {
        self.cell.readiness()
    }

    /// Registers the task for the next commit, then reports readiness.
    /// `Pending` until a sample is available.
    pub fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<Readiness, DeviceError>> {
        match self.cell.register_and_check(cx.waker()) {
            Ok(readiness) if !readiness.data_ready => Poll::Pending,
            other => Poll::Ready(other),
        }
    }

    /// Resolves once a sample is available (or the device stops).
    pub async fn ready(&self) -> Result<Readiness, DeviceError> {
        poll_fn(|cx| self.poll_ready(cx)).await
    }
}

impl Default for SimTemp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimTemp {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SimTemp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimTemp")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::VirtualClock;
    use crate::timer::ManualTimer;
    use tracing_test::traced_test;

    fn manual_device() -> (SimTemp, ManualTimer) {
        let timer = ManualTimer::new();
        let device = SimTemp::builder()
            .timer(timer.clone())
            .clock(VirtualClock::new(0))
            .build();
        (device, timer)
    }

    #[test]
    fn invalid_settings_are_rejected_before_arming() {
        let (device, timer) = manual_device();
        let settings = Settings {
            sampling_ms: 50,
            ..Settings::default()
        };
        assert!(matches!(
            device.start(settings),
            Err(DeviceError::InvalidArgument(_))
        ));
        assert!(!timer.is_armed());
        assert!(!device.is_running());
    }

    #[test]
    fn start_arms_first_tick_one_period_out() {
        let (device, timer) = manual_device();
        device.start(Settings::default()).unwrap();
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(1_000)));
        assert!(matches!(
            device.read(&ReadOptions::nonblocking()),
            Err(DeviceError::WouldBlock)
        ));
    }

    #[test]
    fn stop_disarms_and_rejects_reads() {
        let (device, timer) = manual_device();
        device.start(Settings::default()).unwrap();
        device.stop();
        assert!(!timer.is_armed());
        assert!(matches!(device.poll(), Err(DeviceError::NotReady)));
        device.stop();
    }

    #[test]
    fn short_buffer_is_rejected_without_consuming() {
        let (device, timer) = manual_device();
        device.start(Settings::default()).unwrap();
        timer.fire();

        let mut small = [0u8; SAMPLE_SIZE - 1];
        assert!(matches!(
            device.read_at(&mut small, 0, &ReadOptions::nonblocking()),
            Err(DeviceError::InvalidArgument(_))
        ));
        assert!(device.poll().unwrap().data_ready);
    }

    #[test]
    fn nonzero_offset_is_end_of_data() {
        let (device, timer) = manual_device();
        device.start(Settings::default()).unwrap();
        timer.fire();

        let mut buf = [0u8; SAMPLE_SIZE];
        assert_eq!(
            device.read_at(&mut buf, 16, &ReadOptions::nonblocking()).unwrap(),
            0
        );
        assert_eq!(
            device.read_at(&mut buf, 0, &ReadOptions::nonblocking()).unwrap(),
            SAMPLE_SIZE
        );
        assert_eq!(Sample::decode(&buf).unwrap().temp_mc(), 27_500);
    }

    #[test]
    fn default_read_timeout_covers_longest_period() {
        assert_eq!(
            ReadOptions::blocking().effective_timeout(),
            Duration::from_millis(61_000)
        );
        assert_eq!(
            ReadOptions::blocking()
                .with_timeout(Duration::from_millis(5))
                .effective_timeout(),
            Duration::from_millis(5)
        );
    }

    #[traced_test]
    #[test]
    fn benign_read_outcomes_are_not_errors() {
        let (device, _timer) = manual_device();
        device.start(Settings::default()).unwrap();
        let _ = device.read(&ReadOptions::nonblocking());
        let _ = device.read(&ReadOptions::blocking().with_timeout(Duration::from_millis(5)));

        assert!(logs_contain("would_block"));
        assert!(logs_contain("timed_out"));
        assert!(!logs_contain("ERROR"));
    }
}
