//! Request executor
//!
//! Every outbound call passes through [`RequestExecutor::execute`]:
//! - credential injection per attempt
//! - lazy connection pool creation
//! - pacing through the shared [`RateLimiter`]
//! - uncounted waits on 429 throttling (`Retry-After`)
//! - exponential backoff on transport failures
//! - JSON decoding, never retried on failure

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::ops::Deref;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::backoff::{calculate_backoff, throttle_wait};
use super::params::encode_query;
use super::retry::{format_recovered, RetryContext};
use super::transport::{
    HttpTransport, RawResponse, RequestDescriptor, Transport, TransportOptions,
};
use super::{
    AuthMode, ClientError, ClientResult, Credentials, Params, RateLimiter, TransportError,
};
use crate::config::Settings;
use crate::metrics::{self, HttpRequestMetrics};

/// Bytes of a bad body kept in error messages
const BODY_EXCERPT_LEN: usize = 200;

/// Outcome of a single dispatch
#[derive(Debug)]
pub enum Attempt {
    /// 2xx with a decoded body
    Success(Value),
    /// 429; wait this long, then dispatch again without consuming a retry
    Throttled(Duration),
    /// Transient failure eligible for backoff
    Failed(TransportError),
}

/// Classify a raw response into an [`Attempt`]
///
/// # Errors
/// Returns the JSON error when a 2xx body does not decode. Empty bodies
/// decode to `null`.
pub fn classify_response(
    response: &RawResponse,
    default_wait: Duration,
) -> Result<Attempt, serde_json::Error> {
    let status = response.status;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(Attempt::Throttled(throttle_wait(&response.headers, default_wait)));
    }

    if !status.is_success() {
        return Ok(Attempt::Failed(TransportError::Status {
            status: status.as_u16(),
            body: excerpt(&response.body),
        }));
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Attempt::Success(Value::Null));
    }

    serde_json::from_slice(&response.body).map(Attempt::Success)
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

/// Single choke point for outbound calls
///
/// Share one executor (behind an `Arc`) between concurrent callers so the
/// pacing limit and connection pool apply to all of them.
pub struct RequestExecutor<T: Transport = HttpTransport> {
    settings: Settings,
    credentials: Credentials,
    transport: T,
    limiter: RateLimiter,
}

impl RequestExecutor<HttpTransport> {
    /// Create an executor backed by the reqwest transport
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `settings` are invalid.
    pub fn new(credentials: Credentials, settings: Settings) -> ClientResult<Self> {
        let transport = HttpTransport::new(&settings);
        Self::with_transport(credentials, settings, transport)
    }
}

impl<T: Transport> RequestExecutor<T> {
    /// Create an executor over a custom transport
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `settings` are invalid.
    pub fn with_transport(
        credentials: Credentials,
        settings: Settings,
        transport: T,
    ) -> ClientResult<Self> {
        settings.validate()?;
        let limiter = RateLimiter::with_interval(settings.min_interval());
        Ok(Self {
            settings,
            credentials,
            transport,
            limiter,
        })
    }

    /// Configuration in effect
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Configured credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create the connection pool now instead of on first call
    pub fn connect(&self) -> ClientResult<()> {
        Ok(self.transport.connect()?)
    }

    /// Release the connection pool; the next call reconnects
    pub fn close(&self) {
        self.transport.close();
    }

    /// Whether a live connection pool exists
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect and return a guard that closes the pool when dropped
    pub fn session(&self) -> ClientResult<Session<'_, T>> {
        self.connect()?;
        Ok(Session { executor: self })
    }

    /// GET with default transport options
    pub async fn get(&self, target: &str, params: &Params, auth: AuthMode) -> ClientResult<Value> {
        self.execute(Method::GET, target, params, auth, &TransportOptions::default())
            .await
    }

    /// Execute one call: authenticate, pace, dispatch, retry, decode
    ///
    /// # Errors
    /// - [`ClientError::MissingCredential`] / [`ClientError::InvalidUrl`]
    ///   before any I/O
    /// - [`ClientError::Decode`] on the first malformed 2xx body
    /// - [`ClientError::Transport`] with the last failure once
    ///   `max_retries` retries are used up
    pub async fn execute(
        &self,
        method: Method,
        target: &str,
        params: &Params,
        auth: AuthMode,
        options: &TransportOptions,
    ) -> ClientResult<Value> {
        self.credentials.credential_for(auth)?;
        let url = Url::parse(target).map_err(|e| ClientError::InvalidUrl {
            url: target.to_string(),
            reason: e.to_string(),
        })?;

        if !self.transport.is_connected() {
            self.transport.connect()?;
        }

        let max_retries = self.settings.max_retries;
        let max_attempts = max_retries.saturating_add(1);
        let mut failures: u32 = 0;
        let mut throttle_waits: u32 = 0;
        let mut dispatched: u32 = 0;

        loop {
            let query = self.authorize(params, auth)?;
            self.limiter.pace().await;
            dispatched += 1;

            let request = RequestDescriptor {
                method: method.clone(),
                url: &url,
                query,
                auth,
                options,
            };

            match self.attempt(&request, dispatched).await? {
                Attempt::Success(body) => {
                    if dispatched > 1 {
                        info!("{}", format_recovered(&method, target, dispatched));
                    } else {
                        debug!(%method, url = %target, "Request succeeded");
                    }
                    return Ok(body);
                }
                Attempt::Throttled(wait) => {
                    throttle_waits += 1;
                    if throttle_waits > self.settings.max_throttle_waits {
                        let source = TransportError::Throttled {
                            waits: throttle_waits - 1,
                        };
                        error!(%method, url = %target, attempts = dispatched, "{}", source);
                        return Err(ClientError::Transport {
                            method,
                            url: target.to_string(),
                            attempts: dispatched,
                            source,
                        });
                    }
                    warn!(
                        %method,
                        url = %target,
                        wait_ms = metrics::millis(wait),
                        "Rate limited, sleeping for {:.1} seconds",
                        wait.as_secs_f64()
                    );
                    metrics::record_throttle_wait(wait);
                    sleep(wait).await;
                }
                Attempt::Failed(source) => {
                    throttle_waits = 0;
                    if failures < max_retries {
                        let backoff = calculate_backoff(self.settings.retry_delay, failures);
                        let ctx = RetryContext::new(
                            failures + 1,
                            max_attempts,
                            &source,
                            backoff,
                            &method,
                            target,
                        );
                        warn!(error = %source, "{}", ctx.format_retry());
                        metrics::record_retry_backoff(backoff, failures + 1);
                        sleep(backoff).await;
                        failures += 1;
                        continue;
                    }

                    let ctx = RetryContext::new(
                        dispatched,
                        max_attempts,
                        &source,
                        Duration::ZERO,
                        &method,
                        target,
                    );
                    error!("{}", ctx.format_failure());
                    return Err(ClientError::Transport {
                        method,
                        url: target.to_string(),
                        attempts: dispatched,
                        source,
                    });
                }
            }
        }
    }

    /// Query pairs for one attempt with the credential merged in
    fn authorize(&self, params: &Params, auth: AuthMode) -> ClientResult<Vec<(String, String)>> {
        let mut query = encode_query(params);
        if let Some((name, secret)) = self.credentials.credential_for(auth)? {
            query.retain(|(key, _)| key != name);
            query.push((name.to_string(), secret.to_string()));
        }
        Ok(query)
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor<'_>,
        attempt: u32,
    ) -> ClientResult<Attempt> {
        let recorder = HttpRequestMetrics::start(request.url.path(), attempt);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                recorder.record_network_error(&err.to_string());
                return Ok(Attempt::Failed(err));
            }
        };
        recorder.record_complete(response.status.as_u16());

        classify_response(&response, self.settings.retry_delay).map_err(|source| {
            error!(
                correlation_id = recorder.correlation_id(),
                url = %request.url,
                "Invalid JSON response: {}",
                source
            );
            ClientError::Decode {
                method: request.method.clone(),
                url: request.url.to_string(),
                excerpt: excerpt(&response.body),
                source,
            }
        })
    }
}

impl<T: Transport> std::fmt::Debug for RequestExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("settings", &self.settings)
            .field("credentials", &self.credentials)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Scoped connection: the pool is released when the guard drops
///
/// Dropping happens on every exit path, early `?` returns and panics included.
pub struct Session<'a, T: Transport = HttpTransport> {
    executor: &'a RequestExecutor<T>,
}

impl<T: Transport> Deref for Session<'_, T> {
    type Target = RequestExecutor<T>;

    fn deref(&self) -> &Self::Target {
        self.executor
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.executor.close();
    }
}
