//! Custom validators. Bounds and names come from `simtemp_core` so the file
//! layer and the device reject exactly the same values.

use std::borrow::Cow;

use simtemp_core::limits::{SAMPLING_MS, THRESHOLD_MC};
use simtemp_core::mode::Mode;
use validator::ValidationError;

/// Log levels understood by the telemetry layer.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_sampling_ms(value: u32) -> Result<(), ValidationError> {
    SAMPLING_MS
        .check("sampling_ms", value)
        .map(drop)
        .map_err(|err| with_message("sampling_ms_out_of_range", err.to_string()))
}

pub fn validate_threshold_mc(value: i32) -> Result<(), ValidationError> {
    THRESHOLD_MC
        .check("threshold_mc", value)
        .map(drop)
        .map_err(|err| with_message("threshold_mc_out_of_range", err.to_string()))
}

/// Only the canonical lowercase names are accepted.
pub fn validate_mode(mode: &str) -> Result<(), ValidationError> {
    mode.parse::<Mode>()
        .map(drop)
        .map_err(|err| with_message("invalid_mode", err.to_string()))
}

pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

fn with_message(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bounds_match_the_device() {
        assert!(validate_sampling_ms(100).is_ok());
        assert!(validate_sampling_ms(99).is_err());
        assert!(validate_threshold_mc(-50_000).is_ok());
        assert!(validate_threshold_mc(150_001).is_err());
    }

    #[test]
    fn mode_names_are_exact() {
        assert!(validate_mode("noisy").is_ok());
        assert!(validate_mode("Noisy").is_err());
    }

    #[test]
    fn log_levels_ignore_case() {
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
