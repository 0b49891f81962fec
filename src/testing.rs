//! Scripted transport for exercising the executor without a network
//!
//! [`ScriptedTransport`] replays a queue of canned replies in order and
//! records every request it receives, including when it was dispatched
//! (tokio clock, so paused-time tests see virtual timestamps).
//!
//! # Examples
//!
//! ```
//! use steamy::testing::{ScriptedReply, ScriptedTransport};
//!
//! let transport = ScriptedTransport::new([
//!     ScriptedReply::status(503, "busy"),
//!     ScriptedReply::json(serde_json::json!({"ok": true})),
//! ]);
//! assert_eq!(transport.remaining(), 2);
//! assert!(transport.calls().is_empty());
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

use crate::client::{AuthMode, RawResponse, RequestDescriptor, Transport, TransportError};
use crate::config::ConfigError;

/// One canned reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// An HTTP response
    Response {
        /// Status code
        status: u16,
        /// Response headers
        headers: HeaderMap,
        /// Raw body
        body: Bytes,
    },
    /// A failure without a response
    Error(TransportError),
}

impl ScriptedReply {
    /// 200 with a JSON body
    pub fn json(body: Value) -> Self {
        Self::Response {
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    /// Arbitrary status with a text body
    pub fn status(status: u16, body: &str) -> Self {
        Self::Response {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_owned()),
        }
    }

    /// 429, optionally carrying a `Retry-After` value
    pub fn throttled(retry_after: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(value) = retry_after.and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(RETRY_AFTER, value);
        }
        Self::Response {
            status: 429,
            headers,
            body: Bytes::new(),
        }
    }

    /// Transport failure
    pub fn error(err: TransportError) -> Self {
        Self::Error(err)
    }
}

/// A request seen by the scripted transport
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// HTTP method
    pub method: Method,
    /// Target URL without query
    pub url: String,
    /// Query pairs as sent
    pub query: Vec<(String, String)>,
    /// Authentication mode
    pub auth: AuthMode,
    /// Dispatch time
    pub at: Instant,
}

impl RecordedCall {
    /// Value of the first query pair named `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
struct Inner {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    connected: AtomicBool,
    connects: AtomicUsize,
}

/// Transport that replays scripted replies
///
/// Clones share state, so a test can hand one clone to the executor and
/// inspect the other. Once the script is exhausted every call fails with
/// [`TransportError::Request`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    /// Create a transport replaying `replies` in order
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let transport = Self::default();
        transport.extend(replies);
        transport
    }

    /// Append more replies to the script
    pub fn extend(&self, replies: impl IntoIterator<Item = ScriptedReply>) {
        self.inner
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(replies);
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.inner
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// How many times a pool was created
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn connect(&self) -> Result<(), ConfigError> {
        if !self.inner.connected.swap(true, Ordering::SeqCst) {
            self.inner.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn close(&self) {
        self.inner.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, request: &RequestDescriptor<'_>) -> Result<RawResponse, TransportError> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method: request.method.clone(),
                url: request.url.to_string(),
                query: request.query.clone(),
                auth: request.auth,
                at: Instant::now(),
            });

        let reply = self
            .inner
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(ScriptedReply::Response {
                status,
                headers,
                body,
            }) => Ok(RawResponse {
                status: StatusCode::from_u16(status)
                    .map_err(|e| TransportError::Request(e.to_string()))?,
                headers,
                body,
            }),
            Some(ScriptedReply::Error(err)) => Err(err),
            None => Err(TransportError::Request(
                "scripted transport has no replies left".to_string(),
            )),
        }
    }
}
