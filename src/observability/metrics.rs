//! Metrics collection and exposition.
//!
//! # Metrics
//! - `webhook_requests_total` (counter): webhook requests by status
//! - `webhook_request_duration_seconds` (histogram): handler latency
//! - `subscriptions_processed_total` (counter): applied payments by kind (new, renewal)
//! - `subscription_side_effect_failures_total` (counter): best-effort steps that failed
//!
//! # Design Decisions
//! - Recording through the `metrics` facade is a no-op until `init_metrics` runs
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished webhook request.
pub fn record_request(status: u16, start: Instant) {
    counter!("webhook_requests_total", "status" => status.to_string()).increment(1);
    histogram!("webhook_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record an applied payment.
pub fn record_subscription_processed(kind: &'static str) {
    counter!("subscriptions_processed_total", "kind" => kind).increment(1);
}

/// Record a failed best-effort step.
pub fn record_side_effect_failure(step: &'static str) {
    counter!("subscription_side_effect_failures_total", "step" => step).increment(1);
}
