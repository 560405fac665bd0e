//! Metrics for the data layer
//!
//! Counts row writes per table and times session flushes.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Research Kernel metrics
pub const METRICS_PREFIX: &str = "research_kernel";

/// Histogram buckets for flush latency (in seconds)
pub const FLUSH_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_row_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Rows written through the mutation primitives"
    );

    describe_counter!(
        format!("{}_staged_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Writes staged on a session for the next flush"
    );

    describe_histogram!(
        format!("{}_flush_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Session flush latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Record one row written to `table` by `operation` (insert, update, delete).
///
/// Soft deletes write through the save path and count as updates.
pub fn record_write(table: &str, operation: &'static str) {
    counter!(
        format!("{}_row_writes_total", METRICS_PREFIX),
        "table" => table.to_string(),
        "operation" => operation
    )
    .increment(1);
}

/// Record one write staged for a later flush
pub fn record_staged(table: &str) {
    counter!(
        format!("{}_staged_writes_total", METRICS_PREFIX),
        "table" => table.to_string()
    )
    .increment(1);
}

/// Times a session flush
pub struct FlushTimer {
    start: Instant,
}

impl FlushTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Record flush completion
    pub fn finish(self) {
        histogram!(format!("{}_flush_duration_seconds", METRICS_PREFIX))
            .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in FLUSH_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        register_metrics();
        record_write("client", "insert");
        record_staged("client");
        FlushTimer::start().finish();
    }
}
