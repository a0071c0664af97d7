//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hostmux_requests_total` (counter): requests by decision and status
//! - `hostmux_request_duration_seconds` (histogram): latency by decision
//! - `hostmux_hotlink_rejections_total` (counter): rejected referers by reason
//! - `hostmux_config_reloads_total` (counter): reload attempts by outcome
//!
//! # Design Decisions
//! - Without an installed recorder every update is a no-op
//! - Labels are static strings so the series set stays bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(decision: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "hostmux_requests_total",
        "decision" => decision,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("hostmux_request_duration_seconds", "decision" => decision)
        .record(start.elapsed().as_secs_f64());
}

/// Record a hotlink rejection.
pub fn record_hotlink_rejected(reason: &'static str) {
    ::metrics::counter!("hostmux_hotlink_rejections_total", "reason" => reason).increment(1);
}

/// Record a configuration reload attempt.
pub fn record_config_reload(outcome: &'static str) {
    ::metrics::counter!("hostmux_config_reloads_total", "outcome" => outcome).increment(1);
}
