//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ban_gate_requests_total` (counter): requests by filter outcome
//! - `ban_gate_evictions_total` (counter): removed bans by reason
//! - `ban_gate_ban_table_size` (gauge): entries left in the ban table
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! embedders that skip `init_metrics` pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a filtered request.
pub fn record_outcome(filter: &str, outcome: &'static str) {
    metrics::counter!(
        "ban_gate_requests_total",
        "filter" => filter.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count evicted bans.
pub fn record_eviction(reason: &'static str, count: u64) {
    metrics::counter!("ban_gate_evictions_total", "reason" => reason).increment(count);
}

pub fn record_table_size(size: usize) {
    metrics::gauge!("ban_gate_ban_table_size").set(size as f64);
}
