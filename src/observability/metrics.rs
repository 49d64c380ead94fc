//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hchecker_locks_total` (counter): lock attempts by outcome
//! - `hchecker_state_updates_total` (counter): dead/alive publications
//! - `hchecker_mapping_drift_total` (counter): stale associations dropped
//! - `hchecker_listener_reconnects_total` (counter): eviction channel reconnects
//! - `hchecker_heartbeats_total` (counter): heartbeat writes attempted
//! - `hchecker_tracked_backends` (gauge): backends with a local mapping

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lock_outcome(outcome: &'static str) {
    ::metrics::counter!("hchecker_locks_total", "outcome" => outcome).increment(1);
}

pub fn record_state_update(state: &'static str) {
    ::metrics::counter!("hchecker_state_updates_total", "state" => state).increment(1);
}

pub fn record_mapping_drift() {
    ::metrics::counter!("hchecker_mapping_drift_total").increment(1);
}

pub fn record_listener_reconnect() {
    ::metrics::counter!("hchecker_listener_reconnects_total").increment(1);
}

pub fn record_heartbeat() {
    ::metrics::counter!("hchecker_heartbeats_total").increment(1);
}

pub fn record_tracked_backends(count: usize) {
    ::metrics::gauge!("hchecker_tracked_backends").set(count as f64);
}
