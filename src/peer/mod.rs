//! Peer tracking subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs (periodic timer, two diagnostic calls)
//!     → request.rs (issue call, classify outcome)
//!     → protocol::header (decode response metadata)
//!     → status.rs (apply transition)
//!     → result to caller, or dropped for monitor-only calls
//!
//! set.rs owns every Peer together with its monitor handle.
//! ```
//!
//! # Design Decisions
//! - All observed state sits behind one lock that is never held across an await
//! - Concurrent requests to the same peer are not ordered; last write wins
//! - The bind state is shared through `Arc<PeerContext>`, never global

pub mod monitor;
pub mod request;
pub mod set;
pub mod status;

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;

use crate::context::PeerContext;
use crate::observability::metrics;
use crate::protocol::BlockHeader;

pub use monitor::MonitorHandle;
pub use request::{PeerError, PeerResponse, RequestOptions};
pub use set::PeerSet;
pub use status::PeerStatus;

/// Latency assumed before the first successful round trip.
pub const INITIAL_DELAY_MS: u64 = 10_000;

/// Peers listening below this port are lite clients and are never polled.
pub const LITE_CLIENT_PORT_LIMIT: u16 = 80;

/// URL scheme derived from the peer port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn for_port(port: u16) -> Self {
        if port % 1000 == 443 {
            Protocol::Https
        } else {
            Protocol::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// Mutable observed state of a peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub version: Option<String>,
    pub os: Option<String>,
    pub height: Option<i64>,
    pub headers: Option<BlockHeader>,
    pub nethash: Option<String>,
    pub status: PeerStatus,
    pub public_api: bool,
    /// Reserved; nothing increments it.
    pub requests: u64,
    /// Last round-trip latency in milliseconds.
    pub delay: u64,
    /// Epoch milliseconds of the last dispatched request.
    pub last_checked: u64,
}

impl Default for PeerState {
    fn default() -> Self {
        Self {
            version: None,
            os: None,
            height: None,
            headers: None,
            nethash: None,
            status: PeerStatus::New,
            public_api: false,
            requests: 0,
            delay: INITIAL_DELAY_MS,
            last_checked: 0,
        }
    }
}

/// Public view of a peer returned with every successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerSnapshot {
    pub ip: String,
    pub port: u16,
    pub version: Option<String>,
    pub os: Option<String>,
    pub height: Option<i64>,
    pub status: PeerStatus,
    pub delay: u64,
}

/// One remote node.
pub struct Peer {
    ip: String,
    port: u16,
    protocol: Protocol,
    lite_client: bool,
    context: Arc<PeerContext>,
    state: Mutex<PeerState>,
}

impl Peer {
    pub fn new(ip: impl Into<String>, port: u16, context: Arc<PeerContext>) -> Self {
        Self::with_identity(ip, port, None, None, context)
    }

    /// Construct a peer whose version and OS were already announced.
    pub fn with_identity(
        ip: impl Into<String>,
        port: u16,
        version: Option<String>,
        os: Option<String>,
        context: Arc<PeerContext>,
    ) -> Self {
        let state = PeerState {
            version,
            os,
            ..PeerState::default()
        };
        Self {
            ip: ip.into(),
            port,
            protocol: Protocol::for_port(port),
            lite_client: port < LITE_CLIENT_PORT_LIMIT,
            context,
            state: Mutex::new(state),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_lite_client(&self) -> bool {
        self.lite_client
    }

    pub fn status(&self) -> PeerStatus {
        self.state.lock().status
    }

    pub fn height(&self) -> Option<i64> {
        self.state.lock().height
    }

    pub fn delay(&self) -> u64 {
        self.state.lock().delay
    }

    pub fn last_checked(&self) -> u64 {
        self.state.lock().last_checked
    }

    pub fn public_api(&self) -> bool {
        self.state.lock().public_api
    }

    /// Copy of the full observed state.
    pub fn state(&self) -> PeerState {
        self.state.lock().clone()
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        self.snapshot_of(&self.state.lock())
    }

    /// Stamp the peer as just checked, deferring the next monitor cycle.
    pub fn accept(&self) -> bool {
        self.state.lock().last_checked = now_millis();
        true
    }

    /// Fully qualified URL of an endpoint on this peer.
    pub fn url(&self, endpoint: &str) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("{}://[{}]:{}{}", self.protocol.as_str(), self.ip, self.port, endpoint)
        } else {
            format!("{}{}", self, endpoint)
        }
    }

    fn snapshot_of(&self, state: &PeerState) -> PeerSnapshot {
        PeerSnapshot {
            ip: self.ip.clone(),
            port: self.port,
            version: state.version.clone(),
            os: state.os.clone(),
            height: state.height,
            status: state.status,
            delay: state.delay,
        }
    }

    fn transition(&self, state: &mut PeerState, next: PeerStatus) {
        let previous = state.status;
        state.status = next;
        if previous != next {
            tracing::debug!(peer = %self, from = %previous, to = %next, "Peer status changed");
            metrics::record_peer_status(&self.to_string(), previous, next);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, update: impl FnOnce(&mut PeerState)) {
        update(&mut self.state.lock());
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol.as_str(), self.ip, self.port)
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("lite_client", &self.lite_client)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
