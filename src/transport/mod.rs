//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Carry one request to a peer and hand back status, headers and body
//! - Enforce the per-request timeout
//! - Report failures as short error codes the status machine understands
//!
//! # Design Decisions
//! - The pipeline only sees the `Transport` trait; `http.rs` is the reqwest
//!   implementation used in production
//! - Error codes are strings so unknown codes pass through untouched

pub mod http;
#[cfg(test)]
pub mod mock;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::RawHeaders;

pub use http::HttpTransport;

/// Connection to the peer could not be established.
pub const EUNAVAILABLE: &str = "EUNAVAILABLE";
/// The peer did not answer within the request timeout.
pub const ETIMEOUT: &str = "ETIMEOUT";
/// The request could not be built (bad URL, bad header value).
pub const EINVALID: &str = "EINVALID";
/// The response body could not be read.
pub const EBODY: &str = "EBODY";
/// Any other transport failure.
pub const EREQUEST: &str = "EREQUEST";

/// HTTP method of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully resolved request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// What came back over the wire.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: RawHeaders,
    /// JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
}

/// A transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    pub code: String,
    pub message: String,
}

impl TransportError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Issues requests to peers.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}
