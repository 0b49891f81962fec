//! Integration tests for retry, backoff and throttle behavior
//!
//! Run against the scripted transport with tokio's clock paused, so waits are
//! observed as exact virtual time between recorded dispatches.

use serde_json::json;
use std::time::Duration;
use steamy::client::{AuthMode, ClientError, Credentials, Params, RequestExecutor, TransportError};
use steamy::testing::{ScriptedReply, ScriptedTransport};
use steamy::Settings;

const URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";

fn executor(
    transport: &ScriptedTransport,
    settings: Settings,
) -> RequestExecutor<ScriptedTransport> {
    RequestExecutor::with_transport(
        Credentials::with_api_key("test-key"),
        settings.with_rate_limit(false),
        transport.clone(),
    )
    .unwrap()
}

fn gaps(transport: &ScriptedTransport) -> Vec<Duration> {
    transport
        .calls()
        .windows(2)
        .map(|pair| pair[1].at - pair[0].at)
        .collect()
}

fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected ~{expected:?}, got {actual:?}"
    );
}

fn server_error(status: u16) -> ScriptedReply {
    ScriptedReply::status(status, "upstream unavailable")
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_failures() {
    let transport = ScriptedTransport::new([
        server_error(500),
        ScriptedReply::error(TransportError::Timeout("attempt timed out".into())),
        ScriptedReply::json(json!({"applist": {"apps": []}})),
    ]);
    let settings = Settings::default()
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(100));
    let executor = executor(&transport, settings);

    let body = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert_eq!(body, json!({"applist": {"apps": []}}));

    let gaps = gaps(&transport);
    assert_eq!(gaps.len(), 2);
    assert_close(gaps[0], Duration::from_millis(100));
    assert_close(gaps[1], Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_surfaces_last_error() {
    let transport =
        ScriptedTransport::new([server_error(500), server_error(502), server_error(503)]);
    let settings = Settings::default()
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(10));
    let executor = executor(&transport, settings);

    let err = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap_err();
    match err {
        ClientError::Transport {
            attempts, source, url, ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(url, URL);
            assert!(matches!(source, TransportError::Status { status: 503, .. }));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_makes_one_attempt() {
    let transport = ScriptedTransport::new([server_error(500), ScriptedReply::json(json!({}))]);
    let executor = executor(&transport, Settings::default().with_max_retries(0));

    let err = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.remaining(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_waits_do_not_consume_retries() {
    let transport = ScriptedTransport::new([
        ScriptedReply::throttled(Some("2")),
        ScriptedReply::throttled(Some("2")),
        ScriptedReply::json(json!({"ok": true})),
    ]);
    let executor = executor(&transport, Settings::default().with_max_retries(1));

    let body = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert_eq!(body, json!({"ok": true}));

    let gaps = gaps(&transport);
    assert_eq!(gaps.len(), 2);
    assert_close(gaps[0], Duration::from_secs(2));
    assert_close(gaps[1], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_single_throttle_waits_once() {
    let transport = ScriptedTransport::new([
        ScriptedReply::throttled(Some("2")),
        ScriptedReply::json(json!({"ok": true})),
    ]);
    let executor = executor(&transport, Settings::default().with_max_retries(0));

    executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    let gaps = gaps(&transport);
    assert_eq!(gaps.len(), 1);
    assert_close(gaps[0], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_throttle_without_header_uses_retry_delay() {
    let transport = ScriptedTransport::new([
        ScriptedReply::throttled(None),
        ScriptedReply::throttled(Some("soon")),
        ScriptedReply::json(json!({})),
    ]);
    let settings = Settings::default().with_retry_delay(Duration::from_millis(750));
    let executor = executor(&transport, settings);

    executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    let gaps = gaps(&transport);
    assert_close(gaps[0], Duration::from_millis(750));
    assert_close(gaps[1], Duration::from_millis(750));
}

#[tokio::test(start_paused = true)]
async fn test_fractional_retry_after() {
    let transport = ScriptedTransport::new([
        ScriptedReply::throttled(Some("0.5")),
        ScriptedReply::json(json!({})),
    ]);
    let executor = executor(&transport, Settings::default());

    executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert_close(gaps(&transport)[0], Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_persistent_throttling_is_bounded() {
    let transport = ScriptedTransport::new((0..4).map(|_| ScriptedReply::throttled(Some("1"))));
    let settings = Settings::default().with_max_throttle_waits(2);
    let executor = executor(&transport, settings);

    let err = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap_err();
    match err {
        ClientError::Transport { attempts, source, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(source, TransportError::Throttled { waits: 2 });
        }
        other => panic!("expected throttling failure, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_allowance_resets_after_failure() {
    let transport = ScriptedTransport::new([
        ScriptedReply::throttled(Some("1")),
        server_error(503),
        ScriptedReply::throttled(Some("1")),
        ScriptedReply::json(json!({"ok": 1})),
    ]);
    let settings = Settings::default()
        .with_max_throttle_waits(1)
        .with_max_retries(1)
        .with_retry_delay(Duration::from_millis(10));
    let executor = executor(&transport, settings);

    let body = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert_eq!(body, json!({"ok": 1}));
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_decode_failure_is_not_retried() {
    let transport = ScriptedTransport::new([
        ScriptedReply::status(200, "<html>maintenance</html>"),
        ScriptedReply::json(json!({})),
    ]);
    let executor = executor(&transport, Settings::default().with_max_retries(3));

    let err = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap_err();
    match err {
        ClientError::Decode { excerpt, url, .. } => {
            assert_eq!(excerpt, "<html>maintenance</html>");
            assert_eq!(url, URL);
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.remaining(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_body_decodes_to_null() {
    let transport = ScriptedTransport::new([ScriptedReply::status(200, "")]);
    let executor = executor(&transport, Settings::default());

    let body = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert!(body.is_null());
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_are_retried() {
    let transport = ScriptedTransport::new([server_error(404), ScriptedReply::json(json!([1]))]);
    let settings = Settings::default()
        .with_max_retries(1)
        .with_retry_delay(Duration::from_millis(10));
    let executor = executor(&transport, settings);

    let body = executor.get(URL, &Params::new(), AuthMode::Key).await.unwrap();
    assert_eq!(body, json!([1]));
    assert_eq!(transport.call_count(), 2);
}
