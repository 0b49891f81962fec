//! `call`, `store` and `ping` commands

use clap::Args;
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use super::CliError;
use crate::api::DEFAULT_VERSION;
use crate::client::{AuthMode, ParamValue, Params, Transport};
use crate::Steam;

/// Parse a `key=value` parameter
fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' is not in key=value form"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("'{s}' has an empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse an HTTP method the executor supports
fn parse_method(s: &str) -> Result<Method, String> {
    match s.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        _ => Err(format!(
            "Invalid HTTP method: {s}. Valid options: GET, POST, PUT, DELETE"
        )),
    }
}

fn to_params(pairs: &[(String, String)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), ParamValue::from(v.as_str())))
        .collect()
}

/// Arguments of `steamy call`
#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct CallArgs {
    /// Interface name (e.g. ISteamUser)
    pub interface: String,

    /// Method name (e.g. GetPlayerSummaries)
    pub method: String,

    /// Method version
    #[arg(long, default_value = DEFAULT_VERSION)]
    pub version: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", short = 'p', value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Credential to send: key, token or none
    #[arg(long, default_value = "key")]
    pub auth: AuthMode,

    /// HTTP method
    #[arg(long, default_value = "GET", value_parser = parse_method)]
    pub http_method: Method,
}

impl CallArgs {
    /// Execute the call
    pub async fn execute<T: Transport>(&self, steam: &Steam<T>) -> Result<Value, CliError> {
        info!(
            "Calling {}/{}/{}",
            self.interface, self.method, self.version
        );
        let value = steam
            .request(
                self.http_method.clone(),
                &self.interface,
                &self.method,
                &self.version,
                &to_params(&self.params),
                self.auth,
            )
            .await?;
        Ok(value)
    }
}

/// Arguments of `steamy store`
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Store endpoint (e.g. appdetails)
    pub endpoint: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", short = 'p', value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Credential to send: key, token or none
    #[arg(long, default_value = "none")]
    pub auth: AuthMode,
}

impl StoreArgs {
    /// Execute the store call
    pub async fn execute<T: Transport>(&self, steam: &Steam<T>) -> Result<Value, CliError> {
        info!("Calling store endpoint {}", self.endpoint);
        let value = steam
            .request_store(
                Method::GET,
                &self.endpoint,
                &to_params(&self.params),
                self.auth,
            )
            .await?;
        Ok(value)
    }
}

/// Run the connectivity probe; fails when the probe does
pub async fn ping<T: Transport>(steam: &Steam<T>) -> Result<Value, CliError> {
    let info = steam.api_key_info().await;
    if !info.valid {
        let reason = info.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(CliError::ProbeFailed(reason));
    }
    Ok(serde_json::to_value(info)?)
}
