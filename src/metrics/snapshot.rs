use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub jobs_queued: u64,
    pub jobs_completed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub attempts_total: u64,
    pub timeouts: u64,
    pub retries: u64,
    pub active_workers: u64,
    pub bytes_received: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: u64,
    pub requests_per_second: f64,
    pub elapsed_seconds: f64,
}
