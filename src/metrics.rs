//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "lumagram_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Verification Metrics
    pub static ref VERIFICATION_CODES_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "lumagram_verification_codes_issued_total",
        "Total number of verification code pairs issued"
    ).expect("metric can be created");
    pub static ref VERIFICATION_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_verification_attempts_total", "Total number of verification attempts"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref CODE_DELIVERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_code_deliveries_total", "Total number of verification code deliveries"),
        &["channel", "status"]
    ).expect("metric can be created");

    // Engagement Metrics
    pub static ref TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_toggles_total", "Total number of toggle operations"),
        &["relation", "action"]
    ).expect("metric can be created");
    pub static ref CONTENT_VIEWS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_content_views_total", "Total number of detail views"),
        &["kind"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lumagram_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(VERIFICATION_CODES_ISSUED_TOTAL.clone()))
        .expect("VERIFICATION_CODES_ISSUED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(VERIFICATION_ATTEMPTS_TOTAL.clone()))
        .expect("VERIFICATION_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CODE_DELIVERIES_TOTAL.clone()))
        .expect("CODE_DELIVERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(TOGGLES_TOTAL.clone()))
        .expect("TOGGLES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CONTENT_VIEWS_TOTAL.clone()))
        .expect("CONTENT_VIEWS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
