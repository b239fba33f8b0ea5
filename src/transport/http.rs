//! reqwest-backed transport.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::protocol::RawHeaders;
use crate::transport::{
    Method, OutboundRequest, Transport, TransportError, TransportResponse, EBODY, EINVALID,
    EREQUEST, ETIMEOUT, EUNAVAILABLE,
};

/// The response claimed to be JSON but was not.
pub const EPARSE: &str = "EPARSE";

/// HTTP transport shared by every peer.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("peer-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::new(EINVALID, format!("invalid url '{}': {}", request.url, e)))?;
        let headers = build_headers(&request)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        }
        .headers(headers)
        .timeout(request.timeout);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = raw_headers(response.headers());
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let text = response.text().await.map_err(classify)?;
        let body = if is_json && !text.is_empty() {
            serde_json::from_str(&text)
                .map_err(|e| TransportError::new(EPARSE, format!("invalid JSON body: {}", e)))?
        } else {
            Value::String(text)
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        self.execute(request).boxed()
    }
}

fn build_headers(request: &OutboundRequest) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::new(EINVALID, format!("header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::new(EINVALID, format!("header '{}': {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Flatten response headers into the codec's input mapping. A `blockheader`
/// header carrying a JSON object becomes a nested mapping.
pub fn raw_headers(headers: &HeaderMap) -> RawHeaders {
    let mut raw = RawHeaders::new();
    for (name, value) in headers {
        let Ok(text) = value.to_str() else {
            continue;
        };
        let value = if name.as_str() == "blockheader" {
            match serde_json::from_str::<Value>(text) {
                Ok(parsed @ Value::Object(_)) => parsed,
                _ => Value::String(text.to_string()),
            }
        } else {
            Value::String(text.to_string())
        };
        raw.insert(name.as_str().to_string(), value);
    }
    raw
}

fn classify(err: reqwest::Error) -> TransportError {
    let code = if err.is_timeout() {
        ETIMEOUT
    } else if err.is_connect() {
        EUNAVAILABLE
    } else if err.is_builder() {
        EINVALID
    } else if err.is_body() || err.is_decode() {
        EBODY
    } else {
        EREQUEST
    };
    TransportError::new(code, err.to_string())
}
