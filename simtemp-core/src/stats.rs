//! ## simtemp-core::stats
//! **Generator statistics**
//!
//! Plain counters: they live inside the device state and are only touched
//! with the device lock held, so no atomics are needed.

use std::fmt;

use serde::Serialize;

/// Monotonic counters maintained by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Samples produced.
    pub updates: u64,
    /// Samples above the alert threshold.
    pub alerts: u64,
    /// Samples clamped into the valid range.
    pub errors: u64,
}

impl Statistics {
    #[inline]
    pub(crate) fn record_update(&mut self) {
        self.updates = self.updates.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_alert(&mut self) {
        self.alerts = self.alerts.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updates={} alerts={} errors={}",
            self.updates, self.alerts, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let mut stats = Statistics::default();
        stats.record_update();
        stats.record_update();
        stats.record_alert();
        assert_eq!(
            stats,
            Statistics {
                updates: 2,
                alerts: 1,
                errors: 0
            }
        );
    }

    #[test]
    fn display_matches_attribute_format() {
        let stats = Statistics {
            updates: 3,
            alerts: 1,
            errors: 0,
        };
        assert_eq!(stats.to_string(), "updates=3 alerts=1 errors=0");
    }
}
