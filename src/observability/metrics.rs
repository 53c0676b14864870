//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_requests_total` (counter): requests by method, status, route kind
//! - `server_request_duration_seconds` (histogram): latency distribution
//! - `server_manifest_reloads_total` (counter): successful manifest swaps

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, route_kind: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route_kind.to_string()),
    ];
    metrics::counter!("server_requests_total", &labels).increment(1);
    metrics::histogram!("server_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_manifest_reload() {
    metrics::counter!("server_manifest_reloads_total").increment(1);
}
