//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mapping_cache_loads_total` (counter): cache fills by outcome
//! - `mapping_deploys_total` (counter): deploys by outcome
//! - `mapping_rollbacks_total` (counter): rollbacks by outcome
//! - `mapping_versions_pruned_total` (counter): snapshots removed by retention
//! - `mapping_versions_retained` (gauge): snapshots kept after the last prune
//! - `mapping_admin_requests_total` (counter): admin requests by route, status

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_load(outcome: &'static str) {
    counter!("mapping_cache_loads_total", "outcome" => outcome).increment(1);
}

pub fn record_deploy(outcome: &'static str) {
    counter!("mapping_deploys_total", "outcome" => outcome).increment(1);
}

pub fn record_rollback(outcome: &'static str) {
    counter!("mapping_rollbacks_total", "outcome" => outcome).increment(1);
}

pub fn record_pruned(count: usize) {
    counter!("mapping_versions_pruned_total").increment(count as u64);
}

pub fn record_versions_retained(count: usize) {
    gauge!("mapping_versions_retained").set(count as f64);
}

pub fn record_admin_request(route: String, status: u16) {
    counter!(
        "mapping_admin_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}
