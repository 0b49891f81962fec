//! Integration tests for request pacing

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use steamy::client::{AuthMode, Credentials, Params, RateLimiter, RequestExecutor};
use steamy::testing::{ScriptedReply, ScriptedTransport};
use steamy::Settings;

const URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";

fn ok_replies(n: usize) -> ScriptedTransport {
    ScriptedTransport::new((0..n).map(|i| ScriptedReply::json(json!({ "n": i }))))
}

fn executor(
    transport: &ScriptedTransport,
    settings: Settings,
) -> RequestExecutor<ScriptedTransport> {
    RequestExecutor::with_transport(Credentials::anonymous(), settings, transport.clone()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_calls_are_spaced() {
    let transport = ok_replies(2);
    let executor = executor(&transport, Settings::default().with_requests_per_second(2.0));

    executor.get(URL, &Params::new(), AuthMode::None).await.unwrap();
    executor.get(URL, &Params::new(), AuthMode::None).await.unwrap();

    let calls = transport.calls();
    assert!(calls[1].at - calls[0].at >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_rate_limit_has_no_spacing() {
    let transport = ok_replies(5);
    let executor = executor(
        &transport,
        Settings::default().with_requests_per_second(1.0).with_rate_limit(false),
    );

    for _ in 0..5 {
        executor.get(URL, &Params::new(), AuthMode::None).await.unwrap();
    }

    let calls = transport.calls();
    assert_eq!(calls.len(), 5);
    assert!(calls.iter().all(|c| c.at == calls[0].at));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_the_limit() {
    let transport = ok_replies(6);
    let executor = Arc::new(executor(
        &transport,
        Settings::default().with_requests_per_second(10.0),
    ));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let executor = executor.clone();
            tokio::spawn(async move { executor.get(URL, &Params::new(), AuthMode::None).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut stamps: Vec<_> = transport.calls().into_iter().map(|c| c.at).collect();
    stamps.sort();
    for pair in stamps.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(100));
    }
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_paced_too() {
    let transport = ScriptedTransport::new([
        ScriptedReply::status(500, "boom"),
        ScriptedReply::json(json!({})),
    ]);
    // Backoff (1ms) is shorter than the pacing interval (250ms)
    let settings = Settings::default()
        .with_requests_per_second(4.0)
        .with_retry_delay(Duration::from_millis(1));
    let executor = executor(&transport, settings);

    executor.get(URL, &Params::new(), AuthMode::None).await.unwrap();
    let calls = transport.calls();
    assert!(calls[1].at - calls[0].at >= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_limiter_returns_waited_time() {
    let limiter = RateLimiter::per_second(5.0);
    assert_eq!(limiter.pace().await, Duration::ZERO);
    let waited = limiter.pace().await;
    assert!(waited > Duration::ZERO && waited <= Duration::from_millis(200));
}

#[test]
fn test_limiter_interval_from_settings() {
    let settings = Settings::default().with_requests_per_second(20.0);
    let limiter = RateLimiter::with_interval(settings.min_interval());
    assert_eq!(limiter.min_interval(), Some(Duration::from_millis(50)));
}
