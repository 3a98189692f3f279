//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by tier, status
//! - `proxy_request_duration_seconds` (histogram): latency per tier
//! - `router_selections_total` (counter): decisions by strategy, backend
//! - `router_in_flight` (gauge): in-flight requests per backend
//! - `router_probe_latency_seconds` (histogram): latency samples per worker
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(tier: &'static str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "tier" => tier, "status" => status.to_string()).increment(1);
    histogram!("proxy_request_duration_seconds", "tier" => tier).record(start.elapsed().as_secs_f64());
}

pub fn record_selection(strategy: &'static str, backend: &str) {
    counter!("router_selections_total", "strategy" => strategy, "backend" => backend.to_string())
        .increment(1);
}

pub fn record_in_flight(backend: &str, count: usize) {
    gauge!("router_in_flight", "backend" => backend.to_string()).set(count as f64);
}

pub fn record_probe_latency(backend: &str, rtt: Duration) {
    histogram!("router_probe_latency_seconds", "backend" => backend.to_string()).record(rtt.as_secs_f64());
}
