//! Client configuration
//!
//! [`Settings`] is built once when a client is created and never mutated
//! afterwards. Values come from the `DEFAULT_*` constants below, from
//! `STEAMY_*` environment variables via [`Settings::from_env`], or from the
//! `with_*` setters.

use std::time::Duration;

/// Base URL of the Steam Web API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.steampowered.com";

/// Base URL of the Steam Store API.
pub const DEFAULT_STORE_BASE_URL: &str = "https://store.steampowered.com/api";

/// Per-attempt request timeout in seconds.
/// 30 seconds tolerates slow store endpoints without letting a stalled
/// connection hold a retry slot for minutes.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries after the first attempt.
/// 3 retries with 1s base delay waits at most 1+2+4 = 7 seconds in backoff.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds, also the fallback wait for a 429
/// without a usable `Retry-After` header.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Requests-per-second ceiling for the pacing limiter.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Upper bound on pooled connections kept per host.
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 100;

/// Consecutive 429 waits absorbed before a call gives up.
pub const DEFAULT_MAX_THROTTLE_WAITS: u32 = 10;

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A setting holds a value the client cannot work with
    #[error("invalid setting {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// An environment variable could not be parsed
    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value found
        value: String,
    },

    /// Neither an API key nor an access token is available
    #[error(
        "either a Steam API key or an access token is required \
         (set STEAM_API_KEY or STEAM_ACCESS_TOKEN)"
    )]
    NoCredentials,

    /// The HTTP connection pool could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Immutable client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Timeout applied to every individual transport attempt
    pub request_timeout: Duration,
    /// Retries after the first attempt (total tries = `max_retries + 1`)
    pub max_retries: u32,
    /// Base delay for exponential backoff and default 429 wait
    pub retry_delay: Duration,
    /// Pacing ceiling; only read when `rate_limit_enabled` is set
    pub requests_per_second: f64,
    /// Whether the pacing limiter is active
    pub rate_limit_enabled: bool,
    /// Idle connection bound for the pool
    pub max_connections_per_host: usize,
    /// Consecutive 429 waits allowed before surfacing a transport failure
    pub max_throttle_waits: u32,
    /// Steam Web API base URL
    pub api_base_url: String,
    /// Steam Store API base URL
    pub store_base_url: String,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            rate_limit_enabled: true,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            max_throttle_waits: DEFAULT_MAX_THROTTLE_WAITS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            store_base_url: DEFAULT_STORE_BASE_URL.to_string(),
            user_agent: format!("steamy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Settings {
    /// Load settings from `STEAMY_*` environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] when a variable is set but cannot
    /// be parsed, or any [`Settings::validate`] error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(secs) = parse_var(&lookup, "STEAMY_REQUEST_TIMEOUT_SECS")? {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var(&lookup, "STEAMY_MAX_RETRIES")? {
            settings.max_retries = retries;
        }
        if let Some(ms) = parse_var(&lookup, "STEAMY_RETRY_DELAY_MS")? {
            settings.retry_delay = Duration::from_millis(ms);
        }
        if let Some(rps) = parse_var(&lookup, "STEAMY_REQUESTS_PER_SECOND")? {
            settings.requests_per_second = rps;
        }
        if let Some(raw) = lookup("STEAMY_RATE_LIMIT_ENABLED") {
            settings.rate_limit_enabled = parse_bool(&raw).ok_or(ConfigError::InvalidEnv {
                var: "STEAMY_RATE_LIMIT_ENABLED",
                value: raw,
            })?;
        }
        if let Some(url) = lookup("STEAMY_API_BASE_URL") {
            settings.api_base_url = url;
        }
        if let Some(url) = lookup("STEAMY_STORE_BASE_URL") {
            settings.store_base_url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants the executor relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_enabled
            && !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0)
        {
            return Err(ConfigError::InvalidValue {
                name: "requests_per_second",
                reason: format!("must be a positive number, got {}", self.requests_per_second),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_connections_per_host == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_connections_per_host",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Minimum spacing between dispatches, `None` when pacing is off.
    pub fn min_interval(&self) -> Option<Duration> {
        if !self.rate_limit_enabled {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / self.requests_per_second).ok()
    }

    /// Override the per-attempt timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the retry count.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Override the base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the pacing ceiling.
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Enable or disable pacing.
    pub fn with_rate_limit(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Override the pool bound.
    pub fn with_max_connections_per_host(mut self, connections: usize) -> Self {
        self.max_connections_per_host = connections;
        self
    }

    /// Override the 429 wait allowance.
    pub fn with_max_throttle_waits(mut self, waits: u32) -> Self {
        self.max_throttle_waits = waits;
        self
    }

    /// Point Web API calls at another base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Point Store API calls at another base URL.
    pub fn with_store_base_url(mut self, url: impl Into<String>) -> Self {
        self.store_base_url = url.into();
        self
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
