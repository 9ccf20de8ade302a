//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): latency by service
//! - `gateway_rate_limited_total` (counter): rejections by limiter
//!
//! # Design Decisions
//! - Prometheus exporter on its own port, separate from proxied traffic
//! - Low-overhead updates; labels bounded by the static route table

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Failure is logged, not fatal: the
/// gateway keeps serving without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install metrics exporter");
            return;
        }
    }

    metrics::describe_counter!(
        "gateway_requests_total",
        "Total requests by method, status, and service"
    );
    metrics::describe_histogram!(
        "gateway_request_duration_seconds",
        "Request latency in seconds by service"
    );
    metrics::describe_counter!(
        "gateway_rate_limited_total",
        "Requests rejected by a rate limiter"
    );
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let counter = metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string()
    );
    counter.increment(1);

    let histogram = metrics::histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_string()
    );
    histogram.record(start.elapsed().as_secs_f64());
}

/// Record a rate-limited rejection.
pub fn record_rate_limited(limiter: &str) {
    let counter = metrics::counter!(
        "gateway_rate_limited_total",
        "limiter" => limiter.to_string()
    );
    counter.increment(1);
}
