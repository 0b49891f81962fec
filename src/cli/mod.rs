//! CLI command implementations

pub mod call;
pub mod error;

pub use call::{CallArgs, StoreArgs};
pub use error::CliError;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::client::Credentials;
use crate::config::Settings;
use crate::Steam;

/// How decoded JSON is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Compact,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "compact" => Ok(OutputFormat::Compact),
            _ => Err(format!(
                "Invalid output format: {s}. Valid options: pretty, compact"
            )),
        }
    }
}

impl OutputFormat {
    /// Render `value` in this format
    pub fn render(&self, value: &serde_json::Value) -> Result<String, CliError> {
        let rendered = match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        Ok(rendered)
    }
}

/// Steam Web API command line client
#[derive(Parser, Debug)]
#[command(name = "steamy")]
#[command(about = "Call Steam Web API methods with pacing and retries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Steam Web API key
    #[arg(long, global = true, env = "STEAM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Steam OAuth access token
    #[arg(long, global = true, env = "STEAM_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Maximum number of retries for failed requests (range: 0-20)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: Option<u32>,

    /// Requests-per-second ceiling for the pacing limiter
    #[arg(long, global = true)]
    pub requests_per_second: Option<f64>,

    /// Disable request pacing entirely
    #[arg(long, global = true, default_value_t = false)]
    pub no_rate_limit: bool,

    /// Per-attempt timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Output format (pretty or compact)
    #[arg(long, global = true, default_value = "pretty")]
    pub output_format: OutputFormat,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call a Web API method (`{interface}/{method}/{version}`)
    Call(CallArgs),

    /// Call a Store API endpoint
    Store(StoreArgs),

    /// Check connectivity and credentials
    Ping,
}

impl Cli {
    /// Settings from `STEAMY_*` variables with flag overrides applied
    pub fn settings(&self) -> Result<Settings, CliError> {
        let mut settings = Settings::from_env()?;
        if let Some(retries) = self.max_retries {
            settings = settings.with_max_retries(retries);
        }
        if let Some(rps) = self.requests_per_second {
            settings = settings.with_requests_per_second(rps);
        }
        if self.no_rate_limit {
            settings = settings.with_rate_limit(false);
        }
        if let Some(secs) = self.timeout_secs {
            settings = settings.with_request_timeout(Duration::from_secs(secs));
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Credentials given on the command line (or via clap's env fallback)
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.access_token.clone())
    }

    /// Build the API client
    pub fn client(&self) -> Result<Steam, CliError> {
        Ok(Steam::new(self.credentials(), self.settings()?)?)
    }

    /// Run the selected command and return what should be printed
    pub async fn execute(&self) -> Result<String, CliError> {
        let steam = self.client()?;
        let session = steam.session()?;
        let client: &Steam = &session;

        let value = match &self.command {
            Commands::Call(args) => args.execute(client).await?,
            Commands::Store(args) => args.execute(client).await?,
            Commands::Ping => call::ping(client).await?,
        };

        self.output_format.render(&value)
    }
}
