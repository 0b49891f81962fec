//! Request execution core
//!
//! Every outbound call goes through [`RequestExecutor::execute`], which
//! injects credentials, paces dispatches through the [`RateLimiter`],
//! absorbs 429 throttling, retries transient transport failures with
//! exponential backoff and decodes the JSON body.
//!
//! # Components
//!
//! - [`auth`] - credentials and per-call authentication mode
//! - [`params`] - query parameter values and encoding
//! - [`rate_limit`] - minimum-interval pacing
//! - [`backoff`] - backoff and `Retry-After` computation
//! - [`retry`] - failure classification and retry log messages
//! - [`transport`] - the transport seam and the pooled reqwest transport
//! - [`executor`] - the dispatch loop and session lifecycle
//!
//! # Error Handling
//!
//! [`ClientError`] separates caller mistakes (missing credential, bad URL,
//! bad settings) from remote failures. Only [`TransportError`]s are retried;
//! once retries run out the most recent one is returned as the `source` of
//! [`ClientError::Transport`].

pub mod auth;
pub mod backoff;
pub mod executor;
pub mod params;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use auth::{AuthMode, Credentials};
pub use executor::{Attempt, RequestExecutor, Session};
pub use params::{ParamValue, Params};
pub use rate_limit::RateLimiter;
pub use transport::{HttpTransport, RawResponse, RequestDescriptor, Transport, TransportOptions};

use crate::config::ConfigError;
use reqwest::Method;

/// Failure of a single transport attempt
///
/// These are the only failures the executor retries.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded its timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Server answered with a non-2xx status other than 429
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        body: String,
    },

    /// Server kept answering 429 past the throttle allowance
    #[error("server kept throttling after {waits} waits")]
    Throttled {
        /// Number of 429 waits absorbed before giving up
        waits: u32,
    },

    /// Any other request or body-read failure
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Classify a reqwest error
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors returned by the executor
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The call needs a credential that was not configured; nothing was sent
    #[error("{auth} authentication requested but no {} is configured", .auth.credential_name())]
    MissingCredential {
        /// Requested authentication mode
        auth: AuthMode,
    },

    /// Target could not be parsed as an absolute URL; nothing was sent
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending target
        url: String,
        /// Parser message
        reason: String,
    },

    /// Transport kept failing until retries ran out
    #[error("{method} {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        /// HTTP method of the call
        method: Method,
        /// Target URL (without injected credentials)
        url: String,
        /// Dispatches made, throttled ones included
        attempts: u32,
        /// Most recent underlying failure
        #[source]
        source: TransportError,
    },

    /// Response body was not valid JSON; never retried
    #[error("{method} {url} returned a body that is not valid JSON: {source} (body: {excerpt})")]
    Decode {
        /// HTTP method of the call
        method: Method,
        /// Target URL (without injected credentials)
        url: String,
        /// Start of the offending body
        excerpt: String,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// Body decoded but lacks the structure the caller expects; never retried
    #[error("{url} returned an unexpected body: {reason}")]
    UnexpectedBody {
        /// Target URL (without injected credentials)
        url: String,
        /// What was missing
        reason: String,
    },

    /// Settings or pool construction problem
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// The underlying transport failure, if this is a transport error
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ClientError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether retrying the whole call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

/// Result type for executor operations
pub type ClientResult<T> = Result<T, ClientError>;
