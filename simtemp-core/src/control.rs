//! ## simtemp-core::control
//! **Configuration interface**
//!
//! Typed getters/setters plus a line-oriented attribute surface where each
//! field is read and written as text. Both validate against
//! [`crate::limits`] and leave the field untouched on failure.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::device::SimTemp;
use crate::error::DeviceError;
use crate::limits::{SAMPLING_MS, THRESHOLD_MC};
use crate::mode::Mode;
use crate::stats::Statistics;

/// Fields exposed on the attribute surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    SamplingMs,
    ThresholdMc,
    Mode,
    Stats,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::SamplingMs,
        Attribute::ThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::ThresholdMc => "threshold_mc",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    pub const fn is_writable(self) -> bool {
        !matches!(self, Attribute::Stats)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| DeviceError::InvalidArgument(format!("unknown attribute {s:?}")))
    }
}

impl SimTemp {
    pub fn sampling_ms(&self) -> Result<u32, DeviceError> {
        self.cell.read(|state| state.sampling_ms)
    }

    /// Takes effect from the tick after the one currently scheduled.
    pub fn set_sampling_ms(&self, value: u32) -> Result<(), DeviceError> {
        let value = SAMPLING_MS.check("sampling_ms", value)?;
        self.cell.update(|state| state.sampling_ms = value)?;
        debug!(sampling_ms = value, "Sampling period changed");
        Ok(())
    }

    pub fn threshold_mc(&self) -> Result<i32, DeviceError> {
        self.cell.read(|state| state.threshold_mc)
    }

    pub fn set_threshold_mc(&self, value: i32) -> Result<(), DeviceError> {
        let value = THRESHOLD_MC.check("threshold_mc", value)?;
        self.cell.update(|state| state.threshold_mc = value)?;
        debug!(threshold_mc = value, "Alert threshold changed");
        Ok(())
    }

    pub fn mode(&self) -> Result<Mode, DeviceError> {
        self.cell.read(|state| state.mode)
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), DeviceError> {
        self.cell.update(|state| state.mode = mode)?;
        debug!(%mode, "Mode changed");
        Ok(())
    }

    /// Consistent snapshot of all three counters.
    pub fn stats(&self) -> Result<Statistics, DeviceError> {
        self.cell.read(|state| state.stats)
    }

    /// Text value of `attr`, without a trailing newline.
    pub fn attribute(&self, attr: Attribute) -> Result<String, DeviceError> {
        Ok(match attr {
            Attribute::SamplingMs => self.sampling_ms()?.to_string(),
            Attribute::ThresholdMc => self.threshold_mc()?.to_string(),
            Attribute::Mode => self.mode()?.to_string(),
            Attribute::Stats => self.stats()?.to_string(),
        })
    }

    /// Parses `value` and writes it to `attr`. One trailing `\n` is ignored.
    pub fn set_attribute(&self, attr: Attribute, value: &str) -> Result<(), DeviceError> {
        let value = value.strip_suffix('\n').unwrap_or(value);
        match attr {
            Attribute::SamplingMs => self.set_sampling_ms(parse_number(attr, value)?),
            Attribute::ThresholdMc => self.set_threshold_mc(parse_number(attr, value)?),
            Attribute::Mode => self.set_mode(value.parse()?),
            Attribute::Stats => Err(DeviceError::PermissionDenied(attr.name())),
        }
    }
}

fn parse_number<T: FromStr>(attr: Attribute, value: &str) -> Result<T, DeviceError> {
    value
        .parse()
        .map_err(|_| DeviceError::InvalidArgument(format!("{attr}: {value:?} is not a number")))
}
