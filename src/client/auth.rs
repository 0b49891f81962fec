//! Credentials and per-call authentication selection

use std::fmt;
use std::str::FromStr;

use super::{ClientError, ClientResult};

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "key";

/// Query parameter carrying the access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Environment variable read for the API key
pub const API_KEY_ENV: &str = "STEAM_API_KEY";

/// Environment variable read for the access token
pub const ACCESS_TOKEN_ENV: &str = "STEAM_ACCESS_TOKEN";

/// Which credential a call authenticates with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMode {
    /// Long-lived Web API key, sent as `key`
    #[default]
    Key,
    /// Short-lived OAuth access token, sent as `access_token`
    Token,
    /// Public endpoint, no credential
    None,
}

impl AuthMode {
    /// Query parameter the credential is merged under
    pub fn param_name(&self) -> Option<&'static str> {
        match self {
            AuthMode::Key => Some(API_KEY_PARAM),
            AuthMode::Token => Some(ACCESS_TOKEN_PARAM),
            AuthMode::None => None,
        }
    }

    /// Human-readable credential name used in error messages
    pub fn credential_name(&self) -> &'static str {
        match self {
            AuthMode::Key => "API key",
            AuthMode::Token => "access token",
            AuthMode::None => "credential",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthMode::Key => "api_key",
            AuthMode::Token => "access_token",
            AuthMode::None => "none",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "key" | "api_key" => Ok(AuthMode::Key),
            "token" | "access_token" => Ok(AuthMode::Token),
            "none" => Ok(AuthMode::None),
            _ => Err(format!(
                "Invalid auth mode: {s}. Valid options: key, token, none"
            )),
        }
    }
}

/// API key and access token, either of which may be absent
///
/// Both are opaque to the client. `Debug` never prints them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
    access_token: Option<String>,
}

impl Credentials {
    /// Build from optional secrets; empty strings count as absent
    pub fn new(api_key: Option<String>, access_token: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }

    /// No credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Only an API key
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self::new(Some(key.into()), None)
    }

    /// Only an access token
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self::new(None, Some(token.into()))
    }

    /// Read `STEAM_API_KEY` and `STEAM_ACCESS_TOKEN`
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Credentials::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(API_KEY_ENV), lookup(ACCESS_TOKEN_ENV))
    }

    /// Fill whichever secret is missing from `fallback`
    pub fn or(self, fallback: Credentials) -> Self {
        Self {
            api_key: self.api_key.or(fallback.api_key),
            access_token: self.access_token.or(fallback.access_token),
        }
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Whether an access token is configured
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether neither secret is configured
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.access_token.is_none()
    }

    /// Parameter name and secret to merge for `auth`
    ///
    /// # Errors
    /// [`ClientError::MissingCredential`] when `auth` needs a secret that is
    /// not configured.
    pub fn credential_for(&self, auth: AuthMode) -> ClientResult<Option<(&'static str, &str)>> {
        let secret = match auth {
            AuthMode::None => return Ok(None),
            AuthMode::Key => self.api_key.as_deref(),
            AuthMode::Token => self.access_token.as_deref(),
        };
        match (auth.param_name(), secret) {
            (Some(name), Some(secret)) => Ok(Some((name, secret))),
            _ => Err(ClientError::MissingCredential { auth }),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}
