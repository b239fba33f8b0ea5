//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the peer monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Identifier of the network this node belongs to.
    pub nethash: String,

    /// Identity advertised to peers on every outbound request.
    pub identity: IdentityConfig,

    /// Peer request options and the static peer list.
    pub peers: PeersConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Own node identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Operating system string (e.g., "linux4.15").
    pub os: String,

    /// Node software version.
    pub version: String,

    /// Port this node listens on.
    pub port: u16,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            port: 7000,
        }
    }
}

/// Peer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PeersConfig {
    /// Request options applied to every peer call.
    pub options: PeerOptions,

    /// Peers to track from startup.
    pub list: Vec<PeerAddress>,
}

/// Per-request defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerOptions {
    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PeerOptions {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

impl PeerOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A remote peer address.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PeerAddress {
    /// IP address or host name.
    pub ip: String,

    /// Peer port.
    pub port: u16,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Health check interval in seconds. A cycle only runs when at least this
    /// long has passed since the peer was last contacted.
    pub interval_secs: u64,

    /// Protocol endpoint reporting chain height and the latest block header.
    pub height_path: String,

    /// Public API endpoint probed to detect public API exposure.
    pub public_api_path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            height_path: "/peer/height".to_string(),
            public_api_path: "/api/blocks/getHeight".to_string(),
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("console" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "console".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MonitorConfig = toml::from_str(r#"nethash = "abc""#).unwrap();
        assert_eq!(config.nethash, "abc");
        assert_eq!(config.peers.options.timeout_ms, 5000);
        assert_eq!(config.health_check.interval_secs, 60);
        assert_eq!(config.health_check.height_path, "/peer/height");
        assert!(config.peers.list.is_empty());
    }

    #[test]
    fn test_peer_list_parsing() {
        let config: MonitorConfig = toml::from_str(
            r#"
            nethash = "abc"

            [peers.options]
            timeout_ms = 1500

            [[peers.list]]
            ip = "1.2.3.4"
            port = 7000

            [[peers.list]]
            ip = "5.6.7.8"
            port = 443
            "#,
        )
        .unwrap();

        assert_eq!(config.peers.options.timeout(), Duration::from_millis(1500));
        assert_eq!(config.peers.list.len(), 2);
        assert_eq!(
            config.peers.list[1],
            PeerAddress { ip: "5.6.7.8".into(), port: 443 }
        );
    }
}
