use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec, TextEncoder};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "status"]
    )
    .unwrap()
});

static RATE_LIMIT_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_decisions_total",
        "Rate limit decisions by outcome",
        &["outcome"]
    )
    .unwrap()
});

static RATE_LIMIT_STORE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_store_errors_total",
        "Counter store failures seen by the rate limiter",
        &["kind"]
    )
    .unwrap()
});

static UPLOAD_AUTH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "upload_auth_requests_total",
        "Upload auth parameter requests by result",
        &["result"]
    )
    .unwrap()
});

pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn record_http_request(method: &str, status: u16) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    pub fn record_rate_limit_decision(allowed: bool) {
        let outcome = if allowed { "allowed" } else { "denied" };
        RATE_LIMIT_DECISIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_store_error(kind: &str) {
        RATE_LIMIT_STORE_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_upload_auth(success: bool) {
        let result = if success { "ok" } else { "error" };
        UPLOAD_AUTH_TOTAL.with_label_values(&[result]).inc();
    }

    /// Export all metrics in Prometheus format
    pub fn export() -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        encoder.encode_to_string(&metric_families)
    }
}
