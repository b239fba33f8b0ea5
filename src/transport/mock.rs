//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;

use crate::protocol::RawHeaders;
use crate::transport::{OutboundRequest, Transport, TransportError, TransportResponse};

type Reply = Result<TransportResponse, TransportError>;

/// Answers requests from per-path queues. The last queued reply for a path is
/// repeated once the queue runs dry; unscripted paths fail with EUNAVAILABLE.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    latency: Mutex<Option<Duration>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn ok(&self, path: &str, status: u16, headers: Value, body: Value) {
        self.reply(path, Ok(response(status, headers, body)));
    }

    pub fn fail(&self, path: &str, code: &str) {
        self.reply(path, Err(TransportError::new(code, "scripted failure")));
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, path: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.url.ends_with(path))
            .count()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut replies = self.replies.lock();
        let queue = replies
            .iter_mut()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, queue)| queue);

        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(TransportError::new(crate::transport::EUNAVAILABLE, "no route")),
        }
    }
}

pub fn response(status: u16, headers: Value, body: Value) -> TransportResponse {
    let headers: RawHeaders = headers.as_object().cloned().unwrap_or_default();
    TransportResponse {
        status,
        headers,
        body,
    }
}

impl Transport for MockTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        async move {
            self.sent.lock().push(request.clone());
            let latency = *self.latency.lock();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            self.next_reply(&request.url)
        }
        .boxed()
    }
}
