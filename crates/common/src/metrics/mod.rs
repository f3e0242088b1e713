//! Metrics and observability utilities
//!
//! Prometheus metric names and helpers shared by the gateway and the
//! admission pipeline.

use metrics::{counter, describe_counter, describe_histogram, gauge, describe_gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all IdeaHub metrics
pub const METRICS_PREFIX: &str = "ideahub";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
];

/// Buckets for upstream completion latency
pub const COMPLETION_BUCKETS: &[f64] = &[0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_admissions_total", METRICS_PREFIX),
        Unit::Count,
        "Idea submissions by outcome (accepted, validation, uniqueness, similarity, persistence)"
    );

    describe_histogram!(
        format!("{}_duplicate_scan_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time spent scanning stored ideas for near-duplicates"
    );

    describe_gauge!(
        format!("{}_duplicate_scan_snapshot_size", METRICS_PREFIX),
        Unit::Count,
        "Number of stored ideas compared in the last near-duplicate scan"
    );

    describe_counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total chat-completion requests"
    );

    describe_histogram!(
        format!("{}_assistant_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Chat-completion latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Count one idea submission by outcome
pub fn record_admission(outcome: &'static str) {
    counter!(
        format!("{}_admissions_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one near-duplicate scan
pub fn record_guard_scan(duration_secs: f64, snapshot_size: usize) {
    histogram!(format!("{}_duplicate_scan_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    gauge!(format!("{}_duplicate_scan_snapshot_size", METRICS_PREFIX)).set(snapshot_size as f64);
}

/// Record one chat-completion call
pub fn record_assistant_call(outcome: &'static str, duration_secs: f64) {
    counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(format!("{}_assistant_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_sorted() {
        for buckets in [LATENCY_BUCKETS, COMPLETION_BUCKETS] {
            assert!(buckets.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        let metrics = RequestMetrics::start("POST", "/api/ideas");
        metrics.finish(201);
        record_admission("accepted");
        record_guard_scan(0.001, 12);
        record_assistant_call("success", 0.5);
    }
}
