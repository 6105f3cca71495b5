//! Prometheus metrics for the AI router.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Dispatch counter by service and outcome.
pub static DISPATCH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ai_router_dispatch_total",
        "Total number of AI service dispatch calls",
        &["service", "status"]
    )
    .expect("Failed to register dispatch_total")
});

/// Dispatch duration histogram by service.
pub static DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "ai_router_dispatch_duration_seconds",
        "AI service dispatch duration in seconds",
        &["service"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]
    )
    .expect("Failed to register dispatch_duration")
});

/// Rejected-request counter by reason, for calls that never reach a service.
pub static TRANSPORT_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ai_router_transport_errors_total",
        "Total number of requests rejected before dispatch",
        &["reason"] // bad_method, invalid_json, missing_service
    )
    .expect("Failed to register transport_errors_total")
});

/// Counter of swallowed usage-log write failures.
pub static LOG_WRITE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ai_router_log_write_failures_total",
        "Total number of usage log writes that failed and were swallowed",
        &["service"]
    )
    .expect("Failed to register log_write_failures_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DISPATCH_TOTAL);
    Lazy::force(&DISPATCH_DURATION);
    Lazy::force(&TRANSPORT_ERRORS_TOTAL);
    Lazy::force(&LOG_WRITE_FAILURES_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
