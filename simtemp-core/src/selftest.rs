//! Alert path self-test.
//!
//! Drops the threshold to its minimum so every sample alerts, waits for two
//! priority readings through the readiness interface, then restores the
//! original threshold whatever the outcome.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::device::{ReadOptions, SimTemp};
use crate::error::DeviceError;
use crate::limits::{READ_GRACE, THRESHOLD_MC};

/// Priority readings needed for a pass.
pub const REQUIRED_ALERTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestReport {
    pub alerts_seen: usize,
    pub original_threshold_mc: i32,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.alerts_seen >= REQUIRED_ALERTS
    }
}

/// Enough time for the required alerts at `sampling_ms`, plus one spare
/// period and the read grace.
pub fn default_budget(sampling_ms: u32) -> Duration {
    let period = Duration::from_millis(sampling_ms.into());
    period * (REQUIRED_ALERTS as u32 + 1) + READ_GRACE
}

/// Runs the self-test against a started device. A report with
/// `passed() == false` means the budget ran out; errors are device failures.
pub async fn run_alert_selftest(
    device: &SimTemp,
    budget: Duration,
) -> Result<SelfTestReport, DeviceError> {
    let original_threshold_mc = device.threshold_mc()?;
    device.set_threshold_mc(THRESHOLD_MC.min)?;

    let mut alerts_seen = 0;
    let outcome = timeout(budget, count_alerts(device, &mut alerts_seen)).await;
    let restored = device.set_threshold_mc(original_threshold_mc);

    if let Ok(Err(err)) = outcome {
        return Err(err);
    }
    restored?;

    let report = SelfTestReport {
        alerts_seen,
        original_threshold_mc,
    };
    if report.passed() {
        info!(alerts_seen, "Self-test passed");
    } else {
        warn!(alerts_seen, budget_ms = budget.as_millis(), "Self-test timed out");
    }
    Ok(report)
}

async fn count_alerts(device: &SimTemp, seen: &mut usize) -> Result<(), DeviceError> {
    while *seen < REQUIRED_ALERTS {
        device.ready().await?;
        match device.read(&ReadOptions::nonblocking()) {
            Ok(sample) if sample.is_alert() => *seen += 1,
            Ok(_) | Err(DeviceError::WouldBlock | DeviceError::TryAgain) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
