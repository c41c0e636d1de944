//! Sensor configuration: the values a device is started with.

use serde::{Deserialize, Serialize};
use simtemp_core::device::Settings;
use simtemp_core::limits::{SAMPLING_MS, THRESHOLD_MC};
use simtemp_core::mode::Mode;
use validator::Validate;

use crate::error::ConfigError;
use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Generator period in milliseconds.
    #[serde(default = "default_sampling_ms")]
    #[validate(custom(function = validation::validate_sampling_ms))]
    pub sampling_ms: u32,

    /// Alert threshold in milli-degrees Celsius.
    #[serde(default = "default_threshold_mc")]
    #[validate(custom(function = validation::validate_threshold_mc))]
    pub threshold_mc: i32,

    /// One of `normal`, `noisy`, `ramp`.
    #[serde(default = "default_mode")]
    #[validate(custom(function = validation::validate_mode))]
    pub mode: String,

    /// Fixed RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_sampling_ms() -> u32 {
    SAMPLING_MS.default
}

fn default_threshold_mc() -> i32 {
    THRESHOLD_MC.default
}

fn default_mode() -> String {
    Mode::default().to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sampling_ms: default_sampling_ms(),
            threshold_mc: default_threshold_mc(),
            mode: default_mode(),
            seed: None,
        }
    }
}

impl DeviceConfig {
    /// Settings to pass to `SimTemp::start`.
    pub fn to_settings(&self) -> Result<Settings, ConfigError> {
        let settings = Settings {
            sampling_ms: self.sampling_ms,
            threshold_mc: self.threshold_mc,
            mode: self.mode.parse()?,
            seed: self.seed,
        };
        settings.validate()?;
        Ok(settings)
    }
}
