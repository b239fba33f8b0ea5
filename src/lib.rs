//! Peer status tracking and request mediation.

pub mod config;
pub mod context;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod peer;
pub mod protocol;
pub mod transport;

pub use config::MonitorConfig;
pub use context::PeerContext;
pub use peer::{Peer, PeerError, PeerResponse, PeerSet, PeerSnapshot, PeerStatus, RequestOptions};
