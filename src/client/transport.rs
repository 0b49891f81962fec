//! Transport seam and the pooled reqwest transport
//!
//! The executor talks to the network only through [`Transport`]. The
//! production implementation, [`HttpTransport`], owns a single
//! `reqwest::Client` (the connection pool) that is created lazily and dropped
//! on [`Transport::close`]. Reconnecting after close builds a fresh pool.
//! In-flight requests are capped at `max_connections_per_host`; callers past
//! the cap wait for a permit.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{AuthMode, TransportError};
use crate::config::{ConfigError, Settings};

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Recognized per-call transport overrides
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Extra headers merged over the pool defaults
    pub headers: HeaderMap,
    /// Per-attempt timeout replacing the configured one
    pub timeout: Option<Duration>,
    /// JSON request body
    pub json: Option<Value>,
}

impl TransportOptions {
    /// Add a header override
    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Override the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// One dispatch attempt
#[derive(Debug, Clone)]
pub struct RequestDescriptor<'a> {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: &'a Url,
    /// Query pairs, credential already merged
    pub query: Vec<(String, String)>,
    /// Authentication mode the query was built for
    pub auth: AuthMode,
    /// Transport overrides
    pub options: &'a TransportOptions,
}

/// Undecoded response of one attempt
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Full body
    pub body: Bytes,
}

/// Network seam used by the executor
///
/// `send` returns `Err` only for failures without an HTTP response (timeout,
/// connection, body read). Every HTTP status, 429 and 5xx included, comes
/// back as `Ok` for the executor to classify.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Create the connection pool if none is live
    fn connect(&self) -> Result<(), ConfigError>;

    /// Release the connection pool; no-op when already closed
    fn close(&self);

    /// Whether a live pool exists
    fn is_connected(&self) -> bool;

    /// Perform one request
    async fn send(&self, request: &RequestDescriptor<'_>) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport owning the connection pool
#[derive(Debug)]
pub struct HttpTransport {
    timeout: Duration,
    max_connections: usize,
    user_agent: String,
    pool: Mutex<Option<Client>>,
    in_flight: Arc<Semaphore>,
}

impl HttpTransport {
    /// Create a disconnected transport configured from `settings`
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: settings.request_timeout,
            max_connections: settings.max_connections_per_host,
            user_agent: settings.user_agent.clone(),
            pool: Mutex::new(None),
            in_flight: Arc::new(Semaphore::new(
                settings.max_connections_per_host.min(Semaphore::MAX_PERMITS),
            )),
        }
    }

    /// Requests that may be in flight at once
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Permits currently free
    pub fn available_connections(&self) -> usize {
        self.in_flight.available_permits()
    }

    fn build_client(&self) -> Result<Client, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.max_connections)
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }

    /// Current pool, creating one if needed
    fn client(&self) -> Result<Client, ConfigError> {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = pool.as_ref() {
            return Ok(client.clone());
        }
        let client = self.build_client()?;
        *pool = Some(client.clone());
        info!("Steam API client connected");
        Ok(client)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn connect(&self) -> Result<(), ConfigError> {
        self.client().map(drop)
    }

    fn close(&self) {
        let previous = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            info!("Steam API client disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn send(&self, request: &RequestDescriptor<'_>) -> Result<RawResponse, TransportError> {
        // Held until the body is read
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let client = self
            .client()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .query(&request.query)
            .headers(request.options.headers.clone());
        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.options.json {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        debug!(%status, bytes = body.len(), url = %request.url, "Received response");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
