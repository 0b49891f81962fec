//! Integration tests for credential injection

use serde_json::json;
use std::time::Duration;
use steamy::client::{AuthMode, ClientError, Credentials, Params, RequestExecutor};
use steamy::params;
use steamy::testing::{ScriptedReply, ScriptedTransport};
use steamy::Settings;

const URL: &str = "https://api.steampowered.com/IPlayerService/GetOwnedGames/v1/";

fn executor(
    credentials: Credentials,
    transport: &ScriptedTransport,
) -> RequestExecutor<ScriptedTransport> {
    let settings = Settings::default()
        .with_rate_limit(false)
        .with_retry_delay(Duration::from_millis(1));
    RequestExecutor::with_transport(credentials, settings, transport.clone()).unwrap()
}

#[tokio::test]
async fn test_missing_key_fails_without_io() {
    let transport = ScriptedTransport::new([ScriptedReply::json(json!({}))]);
    let executor = executor(Credentials::with_access_token("token"), &transport);

    let err = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredential { auth: AuthMode::Key }));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(transport.connect_count(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_without_io() {
    let transport = ScriptedTransport::default();
    let executor = executor(Credentials::with_api_key("key"), &transport);

    let err = executor.get(URL, &Params::new(), AuthMode::Token).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredential { auth: AuthMode::Token }));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_key_mode_sends_key_param() {
    let transport = ScriptedTransport::new([ScriptedReply::json(json!({}))]);
    let executor = executor(
        Credentials::new(Some("k-123".into()), Some("t-456".into())),
        &transport,
    );

    executor
        .get(URL, &params! { "steamid" => 76561197960435530u64 }, AuthMode::Key)
        .await
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.param("key"), Some("k-123"));
    assert_eq!(call.param("access_token"), None);
    assert_eq!(call.param("steamid"), Some("76561197960435530"));
    assert_eq!(call.auth, AuthMode::Key);
}

#[tokio::test]
async fn test_token_mode_sends_access_token_param() {
    let transport = ScriptedTransport::new([ScriptedReply::json(json!({}))]);
    let executor = executor(
        Credentials::new(Some("k-123".into()), Some("t-456".into())),
        &transport,
    );

    executor.get(URL, &Params::new(), AuthMode::Token).await.unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.param("access_token"), Some("t-456"));
    assert_eq!(call.param("key"), None);
}

#[tokio::test]
async fn test_none_mode_passes_params_unchanged() {
    let transport = ScriptedTransport::new([ScriptedReply::json(json!({}))]);
    let executor = executor(Credentials::with_api_key("k-123"), &transport);

    executor
        .get(URL, &params! { "appids" => vec![10, 20] }, AuthMode::None)
        .await
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(
        call.query,
        vec![
            ("appids[0]".to_string(), "10".to_string()),
            ("appids[1]".to_string(), "20".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_configured_key_overrides_caller_param() {
    let transport = ScriptedTransport::new([ScriptedReply::json(json!({}))]);
    let executor = executor(Credentials::with_api_key("real"), &transport);

    executor
        .get(URL, &params! { "key" => "spoofed" }, AuthMode::Key)
        .await
        .unwrap();

    let call = &transport.calls()[0];
    let keys: Vec<_> = call.query.iter().filter(|(k, _)| k == "key").collect();
    assert_eq!(keys.len(), 1);
    assert_eq!(call.param("key"), Some("real"));
}

#[tokio::test]
async fn test_credential_present_on_every_attempt() {
    let transport = ScriptedTransport::new([
        ScriptedReply::status(502, "bad gateway"),
        ScriptedReply::throttled(Some("0")),
        ScriptedReply::json(json!({})),
    ]);
    let executor = executor(Credentials::with_api_key("k-123"), &transport);

    executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.param("key") == Some("k-123")));
}

#[test]
fn test_credentials_from_lookup() {
    let creds = Credentials::from_lookup(|var| match var {
        "STEAM_API_KEY" => Some("env-key".to_string()),
        "STEAM_ACCESS_TOKEN" => Some(String::new()),
        _ => None,
    });
    assert!(creds.has_api_key());
    assert!(!creds.has_access_token());

    let merged = Credentials::with_access_token("explicit").or(creds);
    assert!(merged.has_api_key());
    assert!(merged.has_access_token());
    assert!(!format!("{merged:?}").contains("env-key"));
}
