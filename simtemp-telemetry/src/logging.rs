//! ## simtemp-telemetry::logging
//! **`tracing` subscriber setup and sample logging**
//!
//! `RUST_LOG` wins over the configured level when it is set and parses.

use simtemp_core::sample::Sample;
use tracing::{info, info_span, warn};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Fails if one is already installed.
    pub fn init(default_level: &str) -> Result<(), TryInitError> {
        fmt()
            .with_env_filter(Self::filter(default_level))
            .with_thread_names(true)
            .finish()
            .try_init()
    }

    pub fn filter(default_level: &str) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }

    /// One structured line per delivered sample; alerts go out at `warn`.
    pub fn log_sample(sample: &Sample) {
        let span = info_span!("sample", timestamp_ns = sample.timestamp_ns());
        let _entered = span.enter();
        if sample.is_alert() {
            warn!(
                temp_mc = sample.temp_mc(),
                flags = ?sample.flags(),
                "Temperature above threshold"
            );
        } else {
            info!(
                temp_mc = sample.temp_mc(),
                flags = ?sample.flags(),
                "Sample delivered"
            );
        }
    }
}
