//! ## simtemp-core::generator
//! **Periodic sample producer**
//!
//! One tick = one sample. Inputs are copied out under the lock, the reading
//! is computed without it, and the result is committed in a second short
//! critical section.
//!
//! | Mode   | Next value                                     |
//! |--------|------------------------------------------------|
//! | Normal | 27500                                          |
//! | Noisy  | uniform in [25000, 30000)                      |
//! | Ramp   | previous + 100, back to 0 once above 100000    |

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{trace, warn};

use crate::limits::{SAMPLING_MS, TEMPERATURE_MC};
use crate::mode::Mode;
use crate::sample::{Sample, SampleFlags};
use crate::state::{Commit, DeviceCell};
use crate::time::Clock;

pub const NORMAL_TEMP_MC: i32 = 27_500;
pub const NOISY_MIN_MC: i32 = 25_000;
pub const NOISY_MAX_MC: i32 = 30_000;
pub const RAMP_STEP_MC: i32 = 100;
pub const RAMP_CEILING_MC: i32 = 100_000;

#[derive(Debug, Clone, Copy)]
struct TickInput {
    mode: Mode,
    threshold_mc: i32,
    previous_mc: i32,
    period: Duration,
}

/// A raw reading after threshold and range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reading {
    pub(crate) temp_mc: i32,
    pub(crate) flags: SampleFlags,
}

impl Reading {
    fn is_alert(&self) -> bool {
        self.flags.contains(SampleFlags::THRESHOLD_HIGH)
    }

    fn is_out_of_range(&self) -> bool {
        self.flags.contains(SampleFlags::OUT_OF_RANGE)
    }
}

pub(crate) struct Generator {
    cell: Arc<DeviceCell>,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
}

impl Generator {
    pub(crate) fn new(cell: Arc<DeviceCell>, clock: Arc<dyn Clock>, rng: SmallRng) -> Self {
        Self { cell, clock, rng }
    }

    /// Produces and commits one sample. Returns the delay until the next
    /// tick: the period in effect when this tick started.
    pub(crate) fn tick(&mut self) -> Duration {
        let input = self.cell.read(|state| TickInput {
            mode: state.mode,
            threshold_mc: state.threshold_mc,
            previous_mc: state.latest.temp_mc(),
            period: Duration::from_millis(state.sampling_ms.into()),
        });
        let Ok(input) = input else {
            // Stopped between arm and fire; the handle is being cancelled.
            return Duration::from_millis(SAMPLING_MS.default.into());
        };

        let raw = next_value(input.mode, input.previous_mc, &mut self.rng);
        let reading = evaluate(raw, input.threshold_mc);
        let sample = Sample::new(self.clock.now_ns(), reading.temp_mc, reading.flags);

        if reading.is_out_of_range() {
            warn!(raw_mc = raw, clamped_mc = reading.temp_mc, "Generated value clamped");
        }

        let committed = self.cell.commit(Commit {
            sample,
            alert: reading.is_alert(),
            out_of_range: reading.is_out_of_range(),
        });
        if committed {
            trace!(
                mode = %input.mode,
                temp_mc = sample.temp_mc(),
                flags = ?sample.flags(),
                "Sample committed"
            );
        }

        input.period
    }
}

/// Next raw value for `mode`, before any range check.
pub(crate) fn next_value<R: Rng>(mode: Mode, previous_mc: i32, rng: &mut R) -> i32 {
    match mode {
        Mode::Normal => NORMAL_TEMP_MC,
        Mode::Noisy => rng.random_range(NOISY_MIN_MC..NOISY_MAX_MC),
        Mode::Ramp => {
            let next = previous_mc.saturating_add(RAMP_STEP_MC);
            if next > RAMP_CEILING_MC {
                0
            } else {
                next
            }
        }
    }
}

/// Applies the threshold check, then the range check with clamping.
/// The threshold is compared against the raw value.
pub(crate) fn evaluate(raw_mc: i32, threshold_mc: i32) -> Reading {
    let mut flags = SampleFlags::NEW;
    if raw_mc > threshold_mc {
        flags |= SampleFlags::THRESHOLD_HIGH;
    }
    let temp_mc = if TEMPERATURE_MC.contains(raw_mc) {
        raw_mc
    } else {
        flags |= SampleFlags::OUT_OF_RANGE;
        TEMPERATURE_MC.clamp(raw_mc)
    };
    Reading { temp_mc, flags }
}
