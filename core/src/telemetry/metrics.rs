use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rays_processed: usize,
    pub rays_failed: usize,
    pub fields_committed: usize,
    pub masks_computed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_processed(&self) {
        self.update(|m| m.rays_processed += 1);
    }

    pub fn record_error(&self) {
        self.update(|m| m.rays_failed += 1);
    }

    pub fn record_committed(&self, fields: usize) {
        self.update(|m| m.fields_committed += fields);
    }

    pub fn record_mask(&self) {
        self.update(|m| m.masks_computed += 1);
    }

    pub fn reset(&self) {
        self.update(|m| *m = MetricsSnapshot::default());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
