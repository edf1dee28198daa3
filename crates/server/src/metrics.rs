//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; engine, listing source and download
//! client metrics come from `toloka_core::metrics` and share the registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "toloka_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("toloka_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "toloka_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Title Metrics (collected dynamically)
// =============================================================================

/// Tracked titles.
pub static TITLES_TRACKED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("toloka_titles_tracked", "Number of tracked titles").unwrap()
});

/// Whether each external collaborator is configured (1) or not (0).
pub static COMPONENT_CONFIGURED: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "toloka_component_configured",
            "Whether a component is configured",
        ),
        &["component"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Titles
    registry.register(Box::new(TITLES_TRACKED.clone())).unwrap();
    registry
        .register(Box::new(COMPONENT_CONFIGURED.clone()))
        .unwrap();

    // Core metrics (engine, listing source, download client)
    for metric in toloka_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the current store contents.
pub fn collect_dynamic_metrics(state: &AppState) {
    if let Ok(titles) = state.titles().list_all() {
        TITLES_TRACKED.set(titles.len() as i64);
    }
    COMPONENT_CONFIGURED
        .with_label_values(&["engine"])
        .set(i64::from(state.engine().is_some()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exposes_core_metrics() {
        toloka_core::metrics::SYNC_OPERATIONS
            .with_label_values(&["update_all", "no_new_content"])
            .inc();
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/health", "200"])
            .inc();

        let text = encode_metrics();
        assert!(text.contains("toloka_sync_operations_total"));
        assert!(text.contains("toloka_http_requests_total"));
    }
}
