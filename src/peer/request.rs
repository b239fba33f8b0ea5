//! Outbound request pipeline.
//!
//! # Responsibilities
//! - Build and issue one call to a peer
//! - Classify the transport outcome and the protocol header
//! - Fold the classification into the peer's state
//! - Return the body with a snapshot, or a descriptive failure

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::observability::metrics;
use crate::peer::{now_millis, Peer, PeerSnapshot, PeerStatus};
use crate::protocol::ProtocolHeader;
use crate::transport::{Method, OutboundRequest};

/// Per-call options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// JSON body, sent with POST.
    pub data: Option<Value>,
    /// Falls back to the configured peer timeout.
    pub timeout: Option<Duration>,
    /// Merged over the identity headers; these win on conflict.
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            data: None,
            timeout: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn post(data: Value) -> Self {
        Self {
            method: Method::Post,
            data: Some(data),
            ..Self::get()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A successful call.
#[derive(Debug, Clone)]
pub struct PeerResponse {
    pub body: Value,
    pub peer: PeerSnapshot,
}

/// A failed call. The message names the cause, the method and the URL;
/// the peer's status carries the classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error("{code} Request failed {method} {url}")]
    Transport {
        code: String,
        method: Method,
        url: String,
    },

    #[error("Received bad response code {status} {method} {url}")]
    BadResponse {
        status: u16,
        method: Method,
        url: String,
    },

    #[error("Peer is not on the same network {nethash} {method} {url}")]
    NethashMismatch {
        nethash: String,
        method: Method,
        url: String,
    },
}

impl Peer {
    pub async fn get(&self, endpoint: &str) -> Result<PeerResponse, PeerError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post(&self, endpoint: &str, payload: Value) -> Result<PeerResponse, PeerError> {
        self.request(endpoint, RequestOptions::post(payload)).await
    }

    /// GET the protocol height endpoint.
    pub async fn fetch_height(&self) -> Result<PeerResponse, PeerError> {
        let path = self.context.health().height_path.clone();
        self.get(&path).await
    }

    /// Resolve an endpoint and options into a transport request.
    pub(crate) fn outbound(&self, endpoint: &str, options: RequestOptions) -> OutboundRequest {
        OutboundRequest {
            method: options.method,
            url: self.url(endpoint),
            headers: self.context.headers().merged(&options.headers),
            body: options.data,
            timeout: options.timeout.unwrap_or_else(|| self.context.default_timeout()),
        }
    }

    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<PeerResponse, PeerError> {
        let request = self.outbound(endpoint, options);
        let method = request.method;
        let url = request.url.clone();

        self.state.lock().last_checked = now_millis();
        let outcome = self.context.transport().send(request).await;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    let next = state.status.after_transport_error(&err.code);
                    self.transition(&mut state, next);
                }
                tracing::debug!(peer = %self, code = %err.code, error = %err.message, %url, "Peer request failed");
                metrics::record_request(method, "transport_error");
                return Err(PeerError::Transport {
                    code: err.code,
                    method,
                    url,
                });
            }
        };

        let delay = {
            let mut state = self.state.lock();
            state.delay = now_millis().saturating_sub(state.last_checked);
            state.delay
        };
        metrics::record_delay(delay);

        if response.status != 200 {
            {
                let mut state = self.state.lock();
                self.transition(&mut state, PeerStatus::EResponse);
            }
            tracing::debug!(peer = %self, status = response.status, %url, "Peer returned bad response code");
            metrics::record_request(method, "bad_response");
            return Err(PeerError::BadResponse {
                status: response.status,
                method,
                url,
            });
        }

        let header = ProtocolHeader::normalize(&response.headers);
        if let Err(violations) = self.context.schema().validate(&header) {
            tracing::trace!(peer = %self, violations = violations.len(), "No protocol header, treating as public API response");
            let snapshot = {
                let mut state = self.state.lock();
                let next = state.status.after_success();
                self.transition(&mut state, next);
                self.snapshot_of(&state)
            };
            metrics::record_request(method, "ok");
            return Ok(PeerResponse {
                body: response.body,
                peer: snapshot,
            });
        }

        let mut state = self.state.lock();
        state.headers = header.blockheader;
        state.os = header.os;
        state.version = header.version;
        state.height = header.height;
        state.nethash = header.nethash.clone();

        let nethash = header.nethash.unwrap_or_default();
        if nethash != self.context.nethash() {
            self.transition(&mut state, PeerStatus::ENethash);
            drop(state);
            tracing::warn!(peer = %self, %nethash, expected = %self.context.nethash(), "Peer is on another network");
            metrics::record_request(method, "nethash_mismatch");
            return Err(PeerError::NethashMismatch {
                nethash,
                method,
                url,
            });
        }

        let next = state.status.after_success();
        self.transition(&mut state, next);
        let snapshot = self.snapshot_of(&state);
        drop(state);

        metrics::record_request(method, "ok");
        Ok(PeerResponse {
            body: response.body,
            peer: snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{test_context, NETHASH};
    use crate::protocol::{HeaderSchema, SchemaViolation};
    use crate::transport::mock::{response, MockTransport};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, Peer) {
        let transport = Arc::new(MockTransport::new());
        let context = Arc::new(test_context(transport.clone()));
        (transport, Peer::new("1.2.3.4", 7000, context))
    }

    fn protocol_headers(nethash: &str) -> Value {
        json!({
            "height": "100",
            "port": "7000",
            "os": "x",
            "version": "1.0",
            "nethash": nethash,
        })
    }

    #[tokio::test]
    async fn test_valid_header_updates_state() {
        let (transport, peer) = setup();
        transport.ok("/peer/list", 200, protocol_headers(NETHASH), json!({ "peers": [] }));

        let res = peer.get("/peer/list").await.unwrap();
        assert_eq!(res.body, json!({ "peers": [] }));
        assert_eq!(res.peer.status, PeerStatus::Ok);
        assert_eq!(res.peer.height, Some(100));

        let state = peer.state();
        assert_eq!(state.os.as_deref(), Some("x"));
        assert_eq!(state.version.as_deref(), Some("1.0"));
        assert_eq!(state.nethash.as_deref(), Some(NETHASH));
        assert!(state.headers.is_none());
    }

    #[tokio::test]
    async fn test_blockheader_stored() {
        let (transport, peer) = setup();
        let mut headers = protocol_headers(NETHASH);
        headers["blockheader"] = json!({ "id": "77", "height": 100 });
        transport.ok("/peer/list", 200, headers, json!({}));

        peer.get("/peer/list").await.unwrap();
        let block = peer.state().headers.unwrap();
        assert_eq!(block.id, Some(json!("77")));
    }

    #[tokio::test]
    async fn test_nethash_mismatch_fails_call() {
        let (transport, peer) = setup();
        transport.ok("/peer/list", 200, protocol_headers("OTHER"), json!({}));

        let err = peer.get("/peer/list").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Peer is not on the same network OTHER GET http://1.2.3.4:7000/peer/list"
        );
        assert_eq!(peer.status(), PeerStatus::ENethash);
        assert_eq!(peer.state().nethash.as_deref(), Some("OTHER"));
    }

    #[tokio::test]
    async fn test_public_api_response_leaves_identity() {
        let (transport, peer) = setup();
        peer.set_state(|s| {
            s.height = Some(5);
            s.os = Some("old".into());
        });
        transport.ok("/api/x", 200, json!({ "content-type": "application/json" }), json!({ "ok": true }));

        let res = peer.get("/api/x").await.unwrap();
        assert_eq!(res.peer.status, PeerStatus::Ok);
        let state = peer.state();
        assert_eq!(state.height, Some(5));
        assert_eq!(state.os.as_deref(), Some("old"));
        assert_eq!(state.version, None);
        assert_eq!(state.nethash, None);
    }

    #[tokio::test]
    async fn test_fork_is_sticky_on_success() {
        let (transport, peer) = setup();
        peer.set_state(|s| s.status = PeerStatus::Fork);
        transport.ok("/api/x", 200, json!({}), json!({}));
        transport.ok("/peer/list", 200, protocol_headers(NETHASH), json!({}));

        peer.get("/api/x").await.unwrap();
        assert_eq!(peer.status(), PeerStatus::Fork);

        let res = peer.get("/peer/list").await.unwrap();
        assert_eq!(res.peer.status, PeerStatus::Fork);
        assert_eq!(peer.status(), PeerStatus::Fork);
    }

    #[tokio::test]
    async fn test_bad_status_code() {
        let (transport, peer) = setup();
        transport.ok("/peer/list", 503, protocol_headers(NETHASH), json!("down"));

        let err = peer.get("/peer/list").await.unwrap_err();
        assert_eq!(
            err,
            PeerError::BadResponse {
                status: 503,
                method: Method::Get,
                url: "http://1.2.3.4:7000/peer/list".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Received bad response code 503 GET http://1.2.3.4:7000/peer/list"
        );
        assert_eq!(peer.status(), PeerStatus::EResponse);
        assert_eq!(peer.height(), None);
    }

    #[tokio::test]
    async fn test_timeout_recorded() {
        let (transport, peer) = setup();
        peer.set_state(|s| s.status = PeerStatus::Ok);
        transport.fail("/peer/list", "ETIMEOUT");

        let err = peer.post("/peer/list", json!({ "a": 1 })).await.unwrap_err();
        assert_eq!(err.to_string(), "ETIMEOUT Request failed POST http://1.2.3.4:7000/peer/list");
        assert_eq!(peer.status(), PeerStatus::ETimeout);
    }

    #[tokio::test]
    async fn test_unrecognized_transport_code_leaves_status() {
        let (transport, peer) = setup();
        peer.set_state(|s| s.status = PeerStatus::Fork);
        transport.fail("/peer/list", "ECONNREFUSED");

        let err = peer.get("/peer/list").await.unwrap_err();
        assert!(matches!(err, PeerError::Transport { ref code, .. } if code == "ECONNREFUSED"));
        assert_eq!(peer.status(), PeerStatus::Fork);
    }

    #[tokio::test]
    async fn test_delay_only_on_transport_success() {
        let (transport, peer) = setup();
        transport.set_latency(Duration::from_millis(30));
        transport.fail("/down", "EUNAVAILABLE");
        transport.ok("/up", 200, json!({}), json!({}));

        peer.get("/down").await.unwrap_err();
        assert_eq!(peer.delay(), crate::peer::INITIAL_DELAY_MS);
        assert_eq!(peer.status(), PeerStatus::EUnavailable);

        let dispatched = now_millis();
        peer.get("/up").await.unwrap();
        let delay = peer.delay();
        assert!(delay >= 30, "delay {}", delay);
        assert!(delay <= now_millis() - dispatched + 1);
    }

    #[tokio::test]
    async fn test_request_headers_and_body() {
        let (transport, peer) = setup();
        transport.ok("/peer/blocks", 200, json!({}), json!({}));

        let options = RequestOptions::post(json!({ "block": 1 }))
            .header("nethash", "override")
            .timeout(Duration::from_millis(250));
        peer.request("/peer/blocks", options).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let request = &sent[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://1.2.3.4:7000/peer/blocks");
        assert_eq!(request.headers["nethash"], "override");
        assert_eq!(request.headers["os"], "linux");
        assert_eq!(request.headers["port"], "7000");
        assert_eq!(request.body, Some(json!({ "block": 1 })));
        assert_eq!(request.timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_default_timeout_and_last_checked() {
        let (transport, peer) = setup();
        transport.ok("/peer/height", 200, json!({}), json!({ "height": 3 }));

        let before = now_millis();
        peer.fetch_height().await.unwrap();
        assert!(peer.last_checked() >= before);
        assert_eq!(transport.sent()[0].timeout, Duration::from_millis(5000));
    }

    struct RejectAll;

    impl HeaderSchema for RejectAll {
        fn validate(&self, _: &ProtocolHeader) -> Result<(), Vec<SchemaViolation>> {
            Err(vec![SchemaViolation::Missing("anything")])
        }
    }

    #[tokio::test]
    async fn test_custom_schema_is_consulted() {
        let transport = Arc::new(MockTransport::new());
        let context = Arc::new(test_context(transport.clone()).with_schema(Arc::new(RejectAll)));
        let peer = Peer::new("1.2.3.4", 7000, context);
        transport.reply("/peer/list", Ok(response(200, protocol_headers("OTHER"), json!({}))));

        let res = peer.get("/peer/list").await.unwrap();
        assert_eq!(res.peer.status, PeerStatus::Ok);
        assert_eq!(peer.state().nethash, None);
    }
}
