use std::sync::Mutex;

use serde::Serialize;

/// Counters shared by concurrent analyses.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub analyzed: usize,
    pub invalid: usize,
    pub rejected: usize,
    pub thermals: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    /// Counts a flight that made it through construction.
    pub fn record_flight(&self, valid: bool, thermals: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.analyzed += 1;
            metrics.thermals += thermals;
            if !valid {
                metrics.invalid += 1;
            }
        }
    }

    /// Counts input that failed construction outright.
    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
