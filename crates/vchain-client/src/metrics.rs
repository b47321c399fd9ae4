//! Client metrics.
//!
//! Recorded through the `metrics` facade; no-ops unless the embedding
//! application installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Physical requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "vchain_requests_total";

    /// Retries by operation.
    pub const RETRIES_TOTAL: &str = "vchain_retries_total";

    /// Seconds from send to fully read body, by operation.
    pub const LATENCY_SECONDS: &str = "vchain_request_latency_seconds";

    /// Task polls by observed status.
    pub const TASK_POLLS_TOTAL: &str = "vchain_task_polls_total";
}

/// One physical request. Status 0 means no response arrived.
pub fn record_request(operation: &str, status: u16, latency: Duration) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency.as_secs_f64());
}

/// A retry was scheduled for `operation`.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// One observed task status.
pub fn record_poll(status: &str) {
    counter!(
        names::TASK_POLLS_TOTAL,
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_share_prefix() {
        for name in [
            names::REQUESTS_TOTAL,
            names::RETRIES_TOTAL,
            names::LATENCY_SECONDS,
            names::TASK_POLLS_TOTAL,
        ] {
            assert!(name.starts_with("vchain_"), "{}", name);
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("GET profile", 200, Duration::from_millis(12));
        record_retry("GET profile");
        record_poll("RUNNING");
    }
}
