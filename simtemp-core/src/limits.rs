//! ## simtemp-core::limits
//! **Static bounds for every configurable and generated value**
//!
//! | Field          | Min     | Max    | Default |
//! |----------------|---------|--------|---------|
//! | sampling_ms    | 100     | 60000  | 1000    |
//! | threshold_mc   | -50000  | 150000 | 50000   |
//! | temp_mc        | -50000  | 150000 | 25000   |

use std::fmt::Display;
use std::time::Duration;

use crate::error::DeviceError;

/// Inclusive range with a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
    pub default: T,
}

impl<T> Bounds<T> {
    pub const fn new(min: T, max: T, default: T) -> Self {
        Self { min, max, default }
    }
}

impl<T: PartialOrd + Copy + Display> Bounds<T> {
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns `value` unchanged if it is in range, `InvalidArgument` otherwise.
    pub fn check(&self, field: &str, value: T) -> Result<T, DeviceError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(DeviceError::InvalidArgument(format!(
                "{field}={value} outside [{}, {}]",
                self.min, self.max
            )))
        }
    }

    /// Nearest in-range value.
    #[inline]
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Sampling period in milliseconds.
pub const SAMPLING_MS: Bounds<u32> = Bounds::new(100, 60_000, 1_000);

/// Alert threshold in milli-degrees Celsius.
pub const THRESHOLD_MC: Bounds<i32> = Bounds::new(-50_000, 150_000, 50_000);

/// Valid range of generated temperatures. The default is the reading reported
/// before the first tick.
pub const TEMPERATURE_MC: Bounds<i32> = Bounds::new(-50_000, 150_000, 25_000);

/// Slack added on top of the slowest sampling period.
pub const READ_GRACE: Duration = Duration::from_millis(1_000);

/// Default deadline for blocking reads: the slowest possible period plus grace,
/// so a healthy generator never times out a waiting reader.
pub const READ_TIMEOUT: Duration =
    match Duration::from_millis(SAMPLING_MS.max as u64).checked_add(READ_GRACE) {
        Some(timeout) => timeout,
        None => Duration::MAX,
    };
