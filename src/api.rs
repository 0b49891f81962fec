//! Steam Web API facade
//!
//! [`Steam`] wraps a [`RequestExecutor`] with Steam URL conventions:
//!
//! - Web API: `{api_base}/{interface}/{method}/{version}/`, API key auth by default
//! - Store API: `{store_base}/{endpoint}`, unauthenticated by default
//!
//! Endpoint accessors built on top of this type call [`Steam::request`] or
//! [`Steam::request_store`] and interpret the decoded JSON themselves.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Deref;
use tracing::{debug, error, info};

use crate::client::{
    AuthMode, ClientError, ClientResult, Credentials, HttpTransport, Params, RequestExecutor,
    Transport, TransportOptions,
};
use crate::config::{ConfigError, Settings};

/// Interface probed by [`Steam::test_connection`]
pub const PROBE_INTERFACE: &str = "ISteamApps";
/// Method probed by [`Steam::test_connection`]
pub const PROBE_METHOD: &str = "GetAppList";
/// Version probed by [`Steam::test_connection`]
pub const PROBE_VERSION: &str = "v2";

/// Default Web API method version
pub const DEFAULT_VERSION: &str = "v1";

/// Result of [`Steam::api_key_info`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    /// Probe call succeeded
    pub valid: bool,
    /// A connection pool is live
    pub connected: bool,
    /// Summary of the probe result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    /// Why the probe failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Steam Web API client
pub struct Steam<T: Transport = HttpTransport> {
    executor: RequestExecutor<T>,
}

impl Steam<HttpTransport> {
    /// Create a client, filling absent secrets from `STEAM_API_KEY` and
    /// `STEAM_ACCESS_TOKEN`
    ///
    /// # Errors
    /// - [`ConfigError::NoCredentials`] when neither secret is available
    /// - [`ConfigError::InvalidValue`] for unusable settings
    pub fn new(credentials: Credentials, settings: Settings) -> ClientResult<Self> {
        let credentials = credentials.or(Credentials::from_env());
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials.into());
        }
        let executor = RequestExecutor::new(credentials, settings)?;
        info!("Steam API client initialized");
        Ok(Self { executor })
    }

    /// Create a client entirely from the environment
    ///
    /// # Errors
    /// Same as [`Steam::new`], plus [`ConfigError::InvalidEnv`].
    pub fn from_env() -> ClientResult<Self> {
        Self::new(Credentials::anonymous(), Settings::from_env()?)
    }
}

impl<T: Transport> Steam<T> {
    /// Create a client over a custom transport; credentials are used as given
    ///
    /// # Errors
    /// Same as [`Steam::new`].
    pub fn with_transport(
        credentials: Credentials,
        settings: Settings,
        transport: T,
    ) -> ClientResult<Self> {
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials.into());
        }
        let executor = RequestExecutor::with_transport(credentials, settings, transport)?;
        Ok(Self { executor })
    }

    /// Underlying executor
    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    /// Configuration in effect
    pub fn settings(&self) -> &Settings {
        self.executor.settings()
    }

    /// Web API URL for `interface/method/version`
    ///
    /// ```
    /// # use steamy::{Credentials, Settings, Steam};
    /// let steam = Steam::new(Credentials::with_api_key("k"), Settings::default()).unwrap();
    /// assert_eq!(
    ///     steam.build_url("ISteamUser", "GetPlayerSummaries", "v2"),
    ///     "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2/"
    /// );
    /// ```
    pub fn build_url(&self, interface: &str, method: &str, version: &str) -> String {
        let base = self.settings().api_base_url.trim_end_matches('/');
        format!("{base}/{interface}/{method}/{version}/")
    }

    /// Store API URL for `endpoint`
    pub fn build_store_url(&self, endpoint: &str) -> String {
        let base = self.settings().store_base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{base}/{endpoint}")
    }

    /// Call a Web API method
    pub async fn request(
        &self,
        http_method: Method,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
        auth: AuthMode,
    ) -> ClientResult<Value> {
        self.request_with_options(
            http_method,
            interface,
            method,
            version,
            params,
            auth,
            &TransportOptions::default(),
        )
        .await
    }

    /// [`Steam::request`] with transport overrides
    #[allow(clippy::too_many_arguments)]
    pub async fn request_with_options(
        &self,
        http_method: Method,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
        auth: AuthMode,
        options: &TransportOptions,
    ) -> ClientResult<Value> {
        let url = self.build_url(interface, method, version);
        debug!(
            "Making {} request to {}/{}/{} with auth: {}",
            http_method, interface, method, version, auth
        );
        self.executor
            .execute(http_method, &url, params, auth, options)
            .await
    }

    /// Call a Store API endpoint
    pub async fn request_store(
        &self,
        http_method: Method,
        endpoint: &str,
        params: &Params,
        auth: AuthMode,
    ) -> ClientResult<Value> {
        let url = self.build_store_url(endpoint);
        debug!(
            "Making {} store request to {} with auth: {}",
            http_method, endpoint, auth
        );
        self.executor
            .execute(http_method, &url, params, auth, &TransportOptions::default())
            .await
    }

    /// GET a Web API method with the API key
    pub async fn get(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
    ) -> ClientResult<Value> {
        self.request(Method::GET, interface, method, version, params, AuthMode::Key)
            .await
    }

    /// POST a Web API method with the API key
    pub async fn post(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
    ) -> ClientResult<Value> {
        self.request(Method::POST, interface, method, version, params, AuthMode::Key)
            .await
    }

    /// PUT a Web API method with the API key
    pub async fn put(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
    ) -> ClientResult<Value> {
        self.request(Method::PUT, interface, method, version, params, AuthMode::Key)
            .await
    }

    /// DELETE a Web API method with the API key
    pub async fn delete(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &Params,
    ) -> ClientResult<Value> {
        self.request(Method::DELETE, interface, method, version, params, AuthMode::Key)
            .await
    }

    /// Create the connection pool now
    pub fn connect(&self) -> ClientResult<()> {
        self.executor.connect()
    }

    /// Release the connection pool
    pub fn close(&self) {
        self.executor.close();
    }

    /// Whether a live connection pool exists
    pub fn is_connected(&self) -> bool {
        self.executor.is_connected()
    }

    /// Connect and return a guard that disconnects when dropped
    pub fn session(&self) -> ClientResult<SteamSession<'_, T>> {
        self.connect()?;
        Ok(SteamSession { steam: self })
    }

    /// Probe the API with `ISteamApps/GetAppList/v2`
    ///
    /// Failures are logged and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        match self.probe().await {
            Ok(_) => {
                info!("Steam API connection test successful");
                true
            }
            Err(e) => {
                error!("Steam API connection test failed: {}", e);
                false
            }
        }
    }

    /// Whether the configured credentials work
    ///
    /// Steam has no key-introspection endpoint, so this runs the probe call.
    pub async fn api_key_info(&self) -> ApiKeyInfo {
        match self.probe().await {
            Ok(apps) => ApiKeyInfo {
                valid: true,
                connected: true,
                test_result: Some(format!("Successfully retrieved {apps} Steam applications")),
                error: None,
            },
            Err(e) => ApiKeyInfo {
                valid: false,
                connected: self.is_connected(),
                test_result: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Number of apps returned by the probe call
    async fn probe(&self) -> ClientResult<usize> {
        // GetAppList is public; send the key when one is configured
        let auth = if self.executor.credentials().has_api_key() {
            AuthMode::Key
        } else {
            AuthMode::None
        };
        let body = self
            .request(
                Method::GET,
                PROBE_INTERFACE,
                PROBE_METHOD,
                PROBE_VERSION,
                &Params::new(),
                auth,
            )
            .await?;

        body.get("applist")
            .and_then(|list| list.get("apps"))
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| ClientError::UnexpectedBody {
                url: self.build_url(PROBE_INTERFACE, PROBE_METHOD, PROBE_VERSION),
                reason: "invalid response structure from Steam API".to_string(),
            })
    }
}

impl<T: Transport> fmt::Debug for Steam<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_connected() {
            "connected"
        } else {
            "disconnected"
        };
        f.debug_struct("Steam")
            .field("api_key", &"***")
            .field("status", &status)
            .finish()
    }
}

/// Scoped [`Steam`] connection, closed on drop
pub struct SteamSession<'a, T: Transport = HttpTransport> {
    steam: &'a Steam<T>,
}

impl<T: Transport> Deref for SteamSession<'_, T> {
    type Target = Steam<T>;

    fn deref(&self) -> &Self::Target {
        self.steam
    }
}

impl<T: Transport> Drop for SteamSession<'_, T> {
    fn drop(&mut self) {
        self.steam.close();
    }
}

/// Whether a decoded body means "nothing found"
///
/// Steam answers many lookups for unknown ids with `200` and an empty
/// payload. The executor returns those bodies verbatim; accessors use this
/// to map them to `None`.
///
/// ```
/// use serde_json::json;
/// use steamy::api::is_empty_body;
///
/// assert!(is_empty_body(&json!({"response": {}})));
/// assert!(is_empty_body(&json!(null)));
/// assert!(!is_empty_body(&json!({"response": {"players": []}})));
/// ```
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => {
            map.is_empty()
                || (map.len() == 1 && map.get("response").is_some_and(is_empty_body_object))
        }
        Value::Number(_) => false,
    }
}

fn is_empty_body_object(value: &Value) -> bool {
    value.as_object().is_some_and(|m| m.is_empty())
}
