use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MetricsCollector {
    jobs_queued: Arc<AtomicU64>,
    jobs_completed: Arc<AtomicU64>,
    jobs_succeeded: Arc<AtomicU64>,
    jobs_failed: Arc<AtomicU64>,
    attempts_total: Arc<AtomicU64>,
    timeouts: Arc<AtomicU64>,
    retries: Arc<AtomicU64>,
    active_workers: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    total_response_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            jobs_queued: Arc::new(AtomicU64::new(0)),
            jobs_completed: Arc::new(AtomicU64::new(0)),
            jobs_succeeded: Arc::new(AtomicU64::new(0)),
            jobs_failed: Arc::new(AtomicU64::new(0)),
            attempts_total: Arc::new(AtomicU64::new(0)),
            timeouts: Arc::new(AtomicU64::new(0)),
            retries: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            total_response_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_jobs_queued(&self) {
        self.jobs_queued.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_active_workers(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement_active_workers(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    /// One request finished (any outcome) after `duration`.
    pub fn record_attempt(&self, duration: Duration) {
        self.attempts_total.fetch_add(1, Ordering::SeqCst);
        self.total_response_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_bytes(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::SeqCst);
    }

    pub fn record_success(&self) {
        self.jobs_completed.fetch_add(1, Ordering::SeqCst);
        self.jobs_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.jobs_completed.fetch_add(1, Ordering::SeqCst);
        self.jobs_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.attempts_total.load(Ordering::SeqCst);
        let completed = self.jobs_completed.load(Ordering::SeqCst);
        let succeeded = self.jobs_succeeded.load(Ordering::SeqCst);
        let total_time = self.total_response_time_ms.load(Ordering::SeqCst);

        let success_rate = if completed > 0 {
            (succeeded as f64 / completed as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if attempts > 0 {
            total_time / attempts
        } else {
            0
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();

        MetricsSnapshot {
            jobs_queued: self.jobs_queued.load(Ordering::SeqCst),
            jobs_completed: completed,
            jobs_succeeded: succeeded,
            jobs_failed: self.jobs_failed.load(Ordering::SeqCst),
            attempts_total: attempts,
            timeouts: self.timeouts.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            active_workers: self.active_workers.load(Ordering::SeqCst),
            bytes_received: self.bytes_received.load(Ordering::SeqCst),
            success_rate,
            avg_response_time_ms,
            requests_per_second: if elapsed > 0.0 {
                attempts as f64 / elapsed
            } else {
                0.0
            },
            elapsed_seconds: elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_derives_rates() {
        let metrics = MetricsCollector::new();
        metrics.increment_jobs_queued();
        metrics.increment_jobs_queued();
        metrics.record_attempt(Duration::from_millis(100));
        metrics.record_timeout();
        metrics.record_retry();
        metrics.record_attempt(Duration::from_millis(300));
        metrics.record_success();
        metrics.record_attempt(Duration::from_millis(200));
        metrics.record_failure();
        metrics.record_bytes(1024);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_queued, 2);
        assert_eq!(snapshot.jobs_completed, 2);
        assert_eq!(snapshot.attempts_total, 3);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.bytes_received, 1024);
        assert_eq!(snapshot.avg_response_time_ms, 200);
        assert!((snapshot.success_rate - 50.0).abs() < f64::EPSILON);
    }
}
