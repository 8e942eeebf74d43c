//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rotator_requests_total` (counter): requests by method, route, status
//! - `rotator_request_duration_seconds` (histogram): latency distribution
//! - `rotator_addresses_derived_total` (counter): derivations by kind
//! - `rotator_status_lookups_total` (counter): status lookups by outcome
//! - `rotator_config_reloads_total` (counter): reloads by result
//! - `rotator_rpc_health` (gauge): 1=healthy, 0=unhealthy

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("rotator_requests_total", &labels).increment(1);
    histogram!("rotator_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// `kind` is one of `current`, `next`, `range`, `validate`.
pub fn record_addresses_derived(kind: &'static str, count: u64) {
    counter!("rotator_addresses_derived_total", "kind" => kind).increment(count);
}

pub fn record_status_lookup(outcome: &'static str) {
    counter!("rotator_status_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_config_reload(success: bool) {
    let result = if success { "applied" } else { "rejected" };
    counter!("rotator_config_reloads_total", "result" => result).increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    gauge!("rotator_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
