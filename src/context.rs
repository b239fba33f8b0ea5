//! Process-wide bind state.
//!
//! Built once at startup from the configuration, the node's identity and the
//! collaborators, then shared read-only by every [`Peer`](crate::peer::Peer)
//! through an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{HealthCheckConfig, MonitorConfig};
use crate::identity::{IdentityHeaders, SystemIdentity};
use crate::protocol::{BlockVerifier, HeaderSchema, PeerHeaderSchema, TrustingVerifier};
use crate::transport::Transport;

/// Immutable snapshot shared by all peers.
pub struct PeerContext {
    headers: IdentityHeaders,
    nethash: String,
    default_timeout: Duration,
    health: HealthCheckConfig,
    transport: Arc<dyn Transport>,
    schema: Arc<dyn HeaderSchema>,
    verifier: Arc<dyn BlockVerifier>,
}

impl PeerContext {
    /// Capture identity and settings. Uses the built-in header schema and the
    /// trusting verifier until replaced with [`with_schema`](Self::with_schema)
    /// or [`with_verifier`](Self::with_verifier).
    pub fn bind(
        config: &MonitorConfig,
        identity: &dyn SystemIdentity,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            headers: IdentityHeaders::capture(identity),
            nethash: config.nethash.clone(),
            default_timeout: config.peers.options.timeout(),
            health: config.health_check.clone(),
            transport,
            schema: Arc::new(PeerHeaderSchema),
            verifier: Arc::new(TrustingVerifier),
        }
    }

    pub fn with_schema(mut self, schema: Arc<dyn HeaderSchema>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn BlockVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn headers(&self) -> &IdentityHeaders {
        &self.headers
    }

    /// Network identity peers must report.
    pub fn nethash(&self) -> &str {
        &self.nethash
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn health(&self) -> &HealthCheckConfig {
        &self.health
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn schema(&self) -> &dyn HeaderSchema {
        self.schema.as_ref()
    }

    pub fn verifier(&self) -> &dyn BlockVerifier {
        self.verifier.as_ref()
    }
}

impl std::fmt::Debug for PeerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerContext")
            .field("nethash", &self.nethash)
            .field("default_timeout", &self.default_timeout)
            .field("health", &self.health)
            .finish()
    }
}
