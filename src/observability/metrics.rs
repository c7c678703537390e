//! Metrics collection and exposition.
//!
//! # Metrics
//! - `clinic_requests_total` (counter): handled requests by route, method, status
//! - `clinic_request_duration_seconds` (histogram): latency by route
//! - `clinic_rate_limited_total` (counter): admission rejections by action
//! - `clinic_errors_total` (counter): error envelopes by kind
//! - `clinic_rate_keys` (gauge): counters held after the last sweep
//! - `clinic_upstream_errors_total` (counter): failed outbound calls by target

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    counter!(
        "clinic_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("clinic_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(action: &'static str) {
    counter!("clinic_rate_limited_total", "action" => action).increment(1);
}

pub fn record_error(kind: &'static str) {
    counter!("clinic_errors_total", "kind" => kind).increment(1);
}

pub fn record_tracked_keys(count: usize) {
    gauge!("clinic_rate_keys").set(count as f64);
}

pub fn record_upstream_error(target: &'static str) {
    counter!("clinic_upstream_errors_total", "target" => target).increment(1);
}
