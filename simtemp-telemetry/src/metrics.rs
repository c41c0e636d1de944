//! ## simtemp-telemetry::metrics
//! **Prometheus view of device statistics and read outcomes**
//!
//! Statistics are mirrored into gauges on demand with [`MetricsRecorder::observe_stats`];
//! read outcomes are counted as they happen.

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};
use simtemp_core::error::DeviceError;
use simtemp_core::sample::Sample;
use simtemp_core::stats::Statistics;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub updates: prometheus::IntGauge,
    pub alerts: prometheus::IntGauge,
    pub errors: prometheus::IntGauge,
    pub reads: prometheus::IntCounterVec,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let updates = IntGauge::new("simtemp_updates", "Samples produced since start")?;
        let alerts = IntGauge::new("simtemp_alerts", "Samples above the alert threshold")?;
        let errors = IntGauge::new("simtemp_errors", "Samples clamped into range")?;
        let reads = IntCounterVec::new(
            Opts::new("simtemp_reads_total", "Consumer reads by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(updates.clone()))?;
        registry.register(Box::new(alerts.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(reads.clone()))?;

        Ok(Self {
            registry,
            updates,
            alerts,
            errors,
            reads,
        })
    }

    pub fn observe_stats(&self, stats: &Statistics) {
        self.updates.set(saturating_i64(stats.updates));
        self.alerts.set(saturating_i64(stats.alerts));
        self.errors.set(saturating_i64(stats.errors));
    }

    pub fn record_read(&self, result: &Result<Sample, DeviceError>) {
        let outcome = match result {
            Ok(_) => "sample",
            Err(err) => err.name(),
        };
        self.reads.with_label_values(&[outcome]).inc();
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
