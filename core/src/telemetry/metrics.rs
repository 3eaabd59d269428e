use std::sync::Mutex;

/// Tally of pipeline runs shared between the driver and the bridge thread.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub completed: usize,
    pub failed: usize,
    pub detections: usize,
    pub points_kept: usize,
}

struct Metrics {
    snapshot: MetricsSnapshot,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                snapshot: MetricsSnapshot::default(),
            }),
        }
    }

    pub fn record_completed(&self, detections: usize, points_kept: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.completed += 1;
            metrics.snapshot.detections += detections;
            metrics.snapshot.points_kept += points_kept;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| metrics.snapshot)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_accumulates_runs() {
        let recorder = MetricsRecorder::new();
        recorder.record_completed(40, 31);
        recorder.record_completed(10, 9);
        recorder.record_failed();
        assert_eq!(
            recorder.snapshot(),
            MetricsSnapshot {
                completed: 2,
                failed: 1,
                detections: 50,
                points_kept: 40,
            }
        );
    }
}
