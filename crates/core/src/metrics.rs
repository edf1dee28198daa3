//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Engine operations (counts by response code, duration)
//! - Torrent submissions per download client backend
//! - Listing source requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Engine
// =============================================================================

/// Finished operations by type and response code.
pub static SYNC_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("toloka_sync_operations_total", "Total engine operations"),
        &["operation", "response_code"],
    )
    .unwrap()
});

/// Operation duration in seconds.
pub static SYNC_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "toloka_sync_operation_duration_seconds",
            "Duration of engine operations",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// Torrent submissions by backend and result.
pub static TORRENT_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "toloka_torrent_submissions_total",
            "Torrents handed to the download client",
        ),
        &["backend", "result"], // "success", "failed", "timeout"
    )
    .unwrap()
});

/// Listing source requests by operation and result.
pub static LISTING_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "toloka_listing_requests_total",
            "Requests made to the listing source",
        ),
        &["operation", "result"], // operation: "search", "fetch"
    )
    .unwrap()
});

/// All core metrics, for registration in the server registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SYNC_OPERATIONS.clone()),
        Box::new(SYNC_OPERATION_DURATION.clone()),
        Box::new(TORRENT_SUBMISSIONS.clone()),
        Box::new(LISTING_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        SYNC_OPERATIONS
            .with_label_values(&["update_one", "success"])
            .inc();
        let names: Vec<_> = registry
            .gather()
            .into_iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"toloka_sync_operations_total".to_string()));
    }
}
