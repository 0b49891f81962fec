//! CLI error types and conversions

use crate::client::ClientError;
use crate::config::ConfigError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Request failed
    #[error("request error: {0}")]
    ClientError(#[from] ClientError),

    /// Settings could not be loaded
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Result could not be rendered
    #[error("output error: {0}")]
    OutputError(#[from] serde_json::Error),

    /// Connectivity probe failed
    #[error("connection test failed: {0}")]
    ProbeFailed(String),

    /// Metrics exporter could not start
    #[error("metrics error: {0}")]
    MetricsError(String),
}
