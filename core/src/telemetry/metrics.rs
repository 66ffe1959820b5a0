use std::sync::Mutex;

use serde::Serialize;

/// Counters for one survey session.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub finished: usize,
    pub aborted: usize,
    pub retries: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_finished(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.finished += 1;
        }
    }

    pub fn record_aborted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.aborted += 1;
        }
    }

    pub fn record_retry(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.retries += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
