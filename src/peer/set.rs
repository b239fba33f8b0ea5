//! Peer arena.
//!
//! # Responsibilities
//! - Own every tracked peer together with its monitor handle
//! - Start monitoring on insert, cancel it on removal
//! - Provide snapshots for reporting

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::context::PeerContext;
use crate::peer::{MonitorHandle, Peer, PeerSnapshot, PeerStatus};

/// A tracked peer and the handle that keeps its monitor alive.
#[derive(Debug)]
struct PeerRecord {
    peer: Arc<Peer>,
    monitor: Option<MonitorHandle>,
}

/// All peers known to this node, keyed by `(ip, port)`.
#[derive(Debug)]
pub struct PeerSet {
    context: Arc<PeerContext>,
    records: DashMap<(String, u16), PeerRecord>,
}

impl PeerSet {
    pub fn new(context: Arc<PeerContext>) -> Self {
        Self {
            context,
            records: DashMap::new(),
        }
    }

    /// Return the tracked peer for this address, creating it (and starting its
    /// monitor unless it is a lite client) if it is new.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn insert(&self, ip: &str, port: u16) -> Arc<Peer> {
        match self.records.entry((ip.to_string(), port)) {
            Entry::Occupied(entry) => Arc::clone(&entry.get().peer),
            Entry::Vacant(entry) => {
                let peer = Arc::new(Peer::new(ip, port, Arc::clone(&self.context)));
                let monitor = peer.start_monitor();
                tracing::info!(peer = %peer, monitored = monitor.is_some(), "Peer added");
                entry.insert(PeerRecord {
                    peer: Arc::clone(&peer),
                    monitor,
                });
                peer
            }
        }
    }

    pub fn get(&self, ip: &str, port: u16) -> Option<Arc<Peer>> {
        self.records
            .get(&(ip.to_string(), port))
            .map(|record| Arc::clone(&record.peer))
    }

    /// Stop tracking a peer. Its monitor is cancelled before this returns.
    pub fn remove(&self, ip: &str, port: u16) -> Option<Arc<Peer>> {
        let (_, record) = self.records.remove(&(ip.to_string(), port))?;
        if let Some(monitor) = &record.monitor {
            monitor.cancel();
        }
        tracing::info!(peer = %record.peer, "Peer removed");
        Some(record.peer)
    }

    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.records
            .iter()
            .map(|record| Arc::clone(&record.peer))
            .collect()
    }

    pub fn snapshots(&self) -> Vec<PeerSnapshot> {
        self.records
            .iter()
            .map(|record| record.peer.snapshot())
            .collect()
    }

    /// Number of peers in each status.
    pub fn status_counts(&self) -> HashMap<PeerStatus, usize> {
        let mut counts = HashMap::new();
        for record in self.records.iter() {
            *counts.entry(record.peer.status()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every peer, cancelling all monitors.
    pub fn clear(&self) {
        let count = self.records.len();
        self.records.clear();
        tracing::info!(peers = count, "Peer set cleared");
    }
}
