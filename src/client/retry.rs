//! Retry message formatting
//!
//! Classifies transport failures for log output and renders consistent retry,
//! recovery and give-up messages for the executor's dispatch loop.

use reqwest::Method;
use std::time::Duration;

use super::TransportError;

/// Classification of a failed attempt for user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Attempt exceeded its timeout
    Timeout,
    /// Connection refused, DNS failure or similar
    Offline,
    /// HTTP 429 beyond the throttle allowance
    Throttled,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 401/403
    AuthFailed(u16),
    /// Other HTTP 4xx (or unexpected status)
    ClientError(u16),
    /// Anything else
    Generic,
}

impl FailureKind {
    /// Classify a transport failure
    pub fn of(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => Self::Timeout,
            TransportError::Connect(_) => Self::Offline,
            TransportError::Throttled { .. } => Self::Throttled,
            TransportError::Status { status, .. } => match *status {
                401 | 403 => Self::AuthFailed(*status),
                s if s >= 500 => Self::ServerError(s),
                s => Self::ClientError(s),
            },
            TransportError::Request(_) => Self::Generic,
        }
    }

    /// Short description used inside log messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::Timeout => "request timeout",
            Self::Offline => "connection failed",
            Self::Throttled => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::AuthFailed(_) => "authentication failed",
            Self::ClientError(code) => match code {
                400 => "bad request",
                404 => "resource not found",
                _ => "client error",
            },
            Self::Generic => "request error",
        }
    }

    /// Remediation hint shown when a call gives up
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Timeout => "Increase the request timeout or check network latency",
            Self::Offline => "Verify internet connectivity and DNS resolution",
            Self::Throttled => "Lower requests_per_second or spread calls over time",
            Self::ServerError(_) => "Steam may be experiencing issues, try again later",
            Self::AuthFailed(_) => "Verify the API key or access token and its permissions",
            Self::ClientError(_) => "Review interface, method, version and parameters",
            Self::Generic => "Check network connectivity and try again",
        }
    }
}

/// Context for one retry decision
#[derive(Debug, Clone)]
pub struct RetryContext<'a> {
    /// Dispatch number, 1-based
    pub attempt: u32,
    /// Counted attempts allowed (`max_retries + 1`)
    pub max_attempts: u32,
    /// Classification of the failure
    pub kind: FailureKind,
    /// Wait before the next attempt
    pub backoff: Duration,
    /// HTTP method of the call
    pub method: &'a Method,
    /// Target URL of the call
    pub url: &'a str,
    /// Original error message
    pub error_message: String,
}

impl<'a> RetryContext<'a> {
    /// Build a context from the failure that triggered it
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error: &TransportError,
        backoff: Duration,
        method: &'a Method,
        url: &'a str,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            kind: FailureKind::of(error),
            backoff,
            method,
            url,
            error_message: error.to_string(),
        }
    }

    /// Message logged before sleeping for another attempt
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying {} {} (attempt {}/{}) after {} - waiting {:.1} seconds...",
            self.method,
            self.url,
            self.attempt,
            self.max_attempts,
            self.kind.description(),
            self.backoff.as_secs_f64()
        )
    }

    /// Message logged when a call gives up
    pub fn format_failure(&self) -> String {
        [
            format!(
                "[FAILED] {} {} failed after {} attempt(s)",
                self.method, self.url, self.attempt
            ),
            format!("  Last error: {}", self.error_message),
            format!("  Suggestion: {}", self.kind.suggestion()),
        ]
        .join("\n")
    }
}

/// Message logged when a call succeeds after earlier failures or waits
pub fn format_recovered(method: &Method, url: &str, attempt: u32) -> String {
    format!("{method} {url} succeeded on attempt {attempt}")
}
