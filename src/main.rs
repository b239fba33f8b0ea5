//! Peer monitor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     config.toml ──▶ config ──▶ PeerContext (identity headers, nethash,
//!                                  │          transport, schema, verifier)
//!                                  ▼
//!                               PeerSet ──▶ Peer ──▶ monitor (every interval)
//!                                            │          │
//!                                            ▼          ▼
//!                                       request pipeline ──▶ remote peer
//!                                            │
//!                                            ▼
//!                               header codec ──▶ status machine
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use peer_monitor::config::loader::load_config;
use peer_monitor::identity::ConfigIdentity;
use peer_monitor::lifecycle::signals::wait_for_shutdown_signal;
use peer_monitor::lifecycle::Shutdown;
use peer_monitor::observability::{logging, metrics};
use peer_monitor::transport::HttpTransport;
use peer_monitor::{PeerContext, PeerSet};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = load_config(&config_path)
        .map_err(|e| format!("failed to load '{}': {}", config_path.display(), e))?;

    logging::init_logging(&config.observability);

    tracing::info!(
        config_path = %config_path.display(),
        nethash = %config.nethash,
        peers = config.peers.list.len(),
        interval_secs = config.health_check.interval_secs,
        timeout_ms = config.peers.options.timeout_ms,
        "peer-monitor starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let transport = Arc::new(HttpTransport::new()?);
    let identity = ConfigIdentity::from_config(&config);
    let context = Arc::new(PeerContext::bind(&config, &identity, transport));

    let peers = PeerSet::new(context);
    for address in &config.peers.list {
        peers.insert(&address.ip, address.port);
    }

    let shutdown = Shutdown::new();
    let mut stopping = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let mut report = tokio::time::interval(config.health_check.interval());
    loop {
        tokio::select! {
            _ = report.tick() => {
                let counts = peers.status_counts();
                let summary: Vec<String> = counts
                    .iter()
                    .map(|(status, count)| format!("{}={}", status, count))
                    .collect();
                let healthy = peers
                    .peers()
                    .iter()
                    .filter(|peer| peer.status().is_healthy())
                    .count();
                tracing::info!(
                    peers = peers.len(),
                    healthy,
                    statuses = %summary.join(","),
                    "Peer status summary"
                );
            }
            _ = stopping.recv() => break,
        }
    }

    peers.clear();
    tracing::info!("Shutdown complete");
    Ok(())
}
