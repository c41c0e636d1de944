//! # simtemp Configuration
//!
//! Layered configuration for the simulated sensor and its host process.
//!
//! ## Features
//! - **Layering**: defaults, then `config/simtemp.yaml`, then `SIMTEMP_*` env vars
//! - **Validation**: bounds shared with the device, checked before start
//! - **Conversion**: [`DeviceConfig::to_settings`] yields the device `Settings`

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod device;
mod error;
mod telemetry;
pub mod validation;

pub use device::DeviceConfig;
pub use error::ConfigError;
pub use telemetry::TelemetryConfig;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/simtemp.yaml";

/// Environment prefix; nested keys are separated by `__`,
/// e.g. `SIMTEMP_DEVICE__SAMPLING_MS=250`.
pub const ENV_PREFIX: &str = "SIMTEMP_";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct SimTempConfig {
    /// Sensor start-up values.
    #[validate(nested)]
    #[serde(default)]
    pub device: DeviceConfig,

    /// Logging parameters.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SimTempConfig {
    /// Load configuration from the default file and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/simtemp.yaml`, skipped if missing
    /// 3. `SIMTEMP_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let file = path.exists().then_some(path);
        Self::extract(Self::layered(file, ENV_PREFIX))
    }

    /// Load configuration from a specific file, which must exist. Environment
    /// variables still override it.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }
        Self::extract(Self::layered(Some(path), ENV_PREFIX))
    }

    fn layered(file: Option<&Path>, env_prefix: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SimTempConfig::default()));
        if let Some(file) = file {
            figment = figment.merge(Yaml::file(file));
        }
        figment.merge(Env::prefixed(env_prefix).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let file = format!("simtemp-{}-{name}.yaml", std::process::id());
        let path = std::env::temp_dir().join(file);
        fs::write(&path, contents).unwrap();
        path
    }

    fn from_file(path: &Path) -> Result<SimTempConfig, ConfigError> {
        SimTempConfig::extract(SimTempConfig::layered(Some(path), "SIMTEMP_UNUSED_"))
    }

    #[test]
    fn full_config_validation() {
        let config = SimTempConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = write_temp("partial", "device:\n  mode: ramp\n  sampling_ms: 250\n");
        let config = from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.device.mode, "ramp");
        assert_eq!(config.device.sampling_ms, 250);
        assert_eq!(config.device.threshold_mc, 50_000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let path = write_temp("invalid", "device:\n  threshold_mc: 200000\n");
        let result = from_file(&path);
        fs::remove_file(&path).ok();

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("threshold_mc"));
    }

    #[test]
    fn environment_override() {
        std::env::set_var("SIMTEMP_TEST_ENV_DEVICE__THRESHOLD_MC", "42000");
        std::env::set_var("SIMTEMP_TEST_ENV_TELEMETRY__LOG_LEVEL", "debug");
        let config =
            SimTempConfig::extract(SimTempConfig::layered(None, "SIMTEMP_TEST_ENV_")).unwrap();
        assert_eq!(config.device.threshold_mc, 42_000);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_reported() {
        let result = SimTempConfig::load_from_path("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn malformed_yaml_is_a_parsing_error() {
        let path = write_temp("malformed", "device:\n  sampling_ms: [not, a, number]\n");
        let result = from_file(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parsing(_))));
    }
}
