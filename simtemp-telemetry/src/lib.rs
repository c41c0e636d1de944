//! # simtemp Telemetry
//!
//! Logging setup and prometheus metrics for hosts embedding the sensor.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
