//! Peer health monitor.
//!
//! # Responsibilities
//! - Periodically refresh a peer's status via the height endpoint
//! - Re-verify the peer's latest block header (the only way out of FORK)
//! - Probe the public API endpoint to set `public_api`
//!
//! # Design Decisions
//! - A cycle only runs when the peer has not been contacted for a full
//!   interval, so monitor and ordinary traffic never double up
//! - The cycle claims the interval before issuing requests; overlapping
//!   calls see the fresh stamp and back off
//! - The next cycle is scheduled from the peer's own `last_checked`, not a
//!   fixed-period ticker, so a cycle is never lost to timer jitter
//! - Cancellation drops an in-flight cycle, so a removed peer is never written
//! - Verifier failures are logged and read as "no fork"

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::peer::{now_millis, Peer, PeerResponse, PeerStatus, RequestOptions};
use crate::protocol::{BlockHeader, ProtocolHeader, Verdict};

/// Owns a running monitor task. Dropping the handle cancels the monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn cancel(&self) {
        self.shutdown.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl Peer {
    /// Run one health check cycle. Returns `false` without issuing any request
    /// when the peer was contacted less than one interval ago.
    pub async fn update_status(&self) -> bool {
        let interval_ms = self.context.health().interval().as_millis() as u64;
        {
            let mut state = self.state.lock();
            let now = now_millis();
            if now.saturating_sub(state.last_checked) < interval_ms {
                return false;
            }
            state.last_checked = now;
        }

        let health = self.context.health();
        let (height, public_failed) = tokio::join!(
            self.get(&health.height_path),
            self.probe_failed(&health.public_api_path),
        );

        match height {
            Ok(response) => self.apply_height(response),
            Err(err) => tracing::debug!(peer = %self, error = %err, "Height check failed"),
        }

        self.state.lock().public_api = public_failed;
        true
    }

    /// Issue a GET that leaves the peer's state alone and report whether it
    /// would have failed in the request pipeline.
    async fn probe_failed(&self, endpoint: &str) -> bool {
        let request = self.outbound(endpoint, RequestOptions::get());
        match self.context.transport().send(request).await {
            Err(err) => {
                tracing::trace!(peer = %self, code = %err.code, "Public API probe failed");
                true
            }
            Ok(response) if response.status != 200 => true,
            Ok(response) => {
                let header = ProtocolHeader::normalize(&response.headers);
                self.context.schema().validate(&header).is_ok()
                    && header.nethash.as_deref() != Some(self.context.nethash())
            }
        }
    }

    fn apply_height(&self, response: PeerResponse) {
        let header = response.body.get("header").cloned().unwrap_or(Value::Null);
        let verdict = match self.context.verifier().verify_block_header(&header) {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(peer = %self, error = %err, "Failed to verify block header");
                Verdict::Agrees
            }
        };
        if verdict == Verdict::Forked {
            tracing::warn!(peer = %self, "Peer is on a forked chain");
        }

        let mut state = self.state.lock();
        if let Some(height) = response.body.get("height").and_then(Value::as_i64) {
            state.height = Some(height);
        }
        state.headers = header.as_object().map(BlockHeader::from_map);
        self.transition(&mut state, PeerStatus::after_verification(verdict));
    }

    /// Time left until the peer has gone a full interval without contact.
    fn until_next_cycle(&self, interval: Duration) -> Duration {
        let elapsed = now_millis().saturating_sub(self.last_checked());
        interval.saturating_sub(Duration::from_millis(elapsed))
    }

    /// Start the periodic monitor. Lite clients are never polled and get
    /// `None`. The first cycle runs immediately; after that a cycle runs
    /// whenever the peer has gone a full interval without being contacted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_monitor(self: &Arc<Self>) -> Option<MonitorHandle> {
        if self.lite_client {
            return None;
        }

        let shutdown = Shutdown::new();
        let mut cancelled = shutdown.subscribe();
        let peer = Arc::clone(self);
        let interval = self.context.health().interval();

        let task = tokio::spawn(async move {
            let cycle = async {
                loop {
                    time::sleep(peer.until_next_cycle(interval)).await;
                    let ran = peer.update_status().await;
                    metrics::record_monitor_cycle(ran);
                }
            };

            tokio::select! {
                biased;
                _ = cancelled.recv() => {}
                _ = cycle => {}
            }
            tracing::debug!(peer = %peer, "Peer monitor stopped");
        });

        tracing::debug!(peer = %self, interval_secs = interval.as_secs(), "Peer monitor started");
        Some(MonitorHandle { shutdown, task })
    }
}
