//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "socialize_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Federation Metrics
    pub static ref ACTIVITYPUB_ACTIVITIES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_activitypub_activities_received_total", "Total number of ActivityPub activities received"),
        &["activity_type"]
    ).expect("metric can be created");
    pub static ref SIGNATURE_VERIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_signature_verifications_total", "Total number of payload signature checks"),
        &["result"]
    ).expect("metric can be created");
    pub static ref RESPONSES_SIGNED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_responses_signed_total", "Total number of responses passed through the signer"),
        &["status"]
    ).expect("metric can be created");
    pub static ref ACTORS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "socialize_actors_created_total",
        "Total number of actors created with a vault"
    ).expect("metric can be created");

    // Auth Metrics
    pub static ref PROVIDER_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_oauth_provider_checks_total", "Total number of OAuth provider token checks"),
        &["provider", "result"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialize_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(register_all);
}

fn register_all() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(ACTIVITYPUB_ACTIVITIES_RECEIVED.clone()))
        .expect("ACTIVITYPUB_ACTIVITIES_RECEIVED can be registered");
    REGISTRY
        .register(Box::new(SIGNATURE_VERIFICATIONS_TOTAL.clone()))
        .expect("SIGNATURE_VERIFICATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(RESPONSES_SIGNED_TOTAL.clone()))
        .expect("RESPONSES_SIGNED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACTORS_CREATED_TOTAL.clone()))
        .expect("ACTORS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PROVIDER_CHECKS_TOTAL.clone()))
        .expect("PROVIDER_CHECKS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
