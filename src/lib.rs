//! # Steamy
//!
//! Request execution core for the Steam Web API. Every call is authenticated,
//! paced, retried and decoded through one shared executor, so endpoint
//! wrappers only build parameters and interpret JSON.
//!
//! ## Features
//!
//! - **Per-call Authentication**: API key (`key`), access token (`access_token`) or none
//! - **Rate Limiting**: minimum spacing between dispatches, shared by concurrent callers
//! - **Throttle Handling**: HTTP 429 honours `Retry-After` without consuming a retry
//! - **Exponential Backoff**: transient failures retried with `base * 2^attempt`
//! - **Scoped Sessions**: connection pool released when the session guard drops
//!
//! ## Quick Start
//!
//! ```no_run
//! use steamy::{params, Credentials, Settings, Steam};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let steam = Steam::new(Credentials::with_api_key("XXXX"), Settings::default())?;
//! let session = steam.session()?;
//!
//! let summaries = session
//!     .get(
//!         "ISteamUser",
//!         "GetPlayerSummaries",
//!         "v2",
//!         &params! { "steamids" => "76561197960435530" },
//!     )
//!     .await?;
//! println!("{summaries}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - executor, rate limiter, backoff and the transport seam
//! - [`api`] - Steam URL conventions on top of the executor
//! - [`config`] - settings, defaults and environment loading
//! - [`metrics`] - Prometheus metrics and correlation ids
//! - `testing` - scripted transport for exercising the executor offline
//!   (`test-utils` feature)
//! - [`cli`] - the `steamy` command line tool

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Steam Web API facade
pub mod api;

/// CLI command implementations
pub mod cli;

/// Request execution core
pub mod client;

/// Client configuration
pub mod config;

/// Observability metrics
pub mod metrics;

/// Offline transport for tests and benches
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types
pub use api::{ApiKeyInfo, Steam, SteamSession};
pub use client::{
    AuthMode, ClientError, ClientResult, Credentials, ParamValue, Params, RequestExecutor,
    TransportError, TransportOptions,
};
pub use config::{ConfigError, Settings};
