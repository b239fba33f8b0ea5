//! Metrics collection and exposition.
//!
//! # Metrics
//! - `peer_requests_total` (counter): outbound calls by method and outcome
//! - `peer_request_delay_ms` (histogram): round-trip latency of answered calls
//! - `peer_status` (gauge): 1 for a peer's current status, 0 for the one it left
//! - `peer_monitor_cycles_total` (counter): monitor ticks, executed or skipped
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing for it.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::peer::PeerStatus;
use crate::transport::Method;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: Method, outcome: &'static str) {
    counter!("peer_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_delay(delay_ms: u64) {
    histogram!("peer_request_delay_ms").record(delay_ms as f64);
}

pub fn record_peer_status(peer: &str, previous: PeerStatus, current: PeerStatus) {
    gauge!("peer_status", "peer" => peer.to_string(), "status" => previous.as_str()).set(0.0);
    gauge!("peer_status", "peer" => peer.to_string(), "status" => current.as_str()).set(1.0);
}

pub fn record_monitor_cycle(executed: bool) {
    let result = if executed { "executed" } else { "skipped" };
    counter!("peer_monitor_cycles_total", "result" => result).increment(1);
}
