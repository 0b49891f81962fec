//! Integration tests for the `steamy` binary

use assert_cmd::Command;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn steamy() -> Command {
    let mut cmd = Command::cargo_bin("steamy").unwrap();
    cmd.env_remove("STEAM_API_KEY")
        .env_remove("STEAM_ACCESS_TOKEN")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let output = steamy().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("call"));
    assert!(stdout.contains("store"));
    assert!(stdout.contains("ping"));
    assert!(stdout.contains("--max-retries"));
}

#[test]
fn test_missing_credentials_fail() {
    let output = steamy()
        .args(["call", "ISteamApps", "GetAppList", "--version", "v2"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("either a Steam API key or an access token is required"));
}

#[test]
fn test_invalid_auth_mode_rejected() {
    steamy()
        .env("STEAM_API_KEY", "k")
        .args(["call", "ISteamApps", "GetAppList", "--auth", "cookie"])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_prints_decoded_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISteamUser/GetPlayerSummaries/v2/"))
        .and(query_param("key", "cli-key"))
        .and(query_param("steamids", "76561197960435530"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"players": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        steamy()
            .env("STEAM_API_KEY", "cli-key")
            .env("STEAMY_API_BASE_URL", uri)
            .args([
                "call",
                "ISteamUser",
                "GetPlayerSummaries",
                "--version",
                "v2",
                "--param",
                "steamids=76561197960435530",
                "--output-format",
                "compact",
                "--no-rate-limit",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), r#"{"response":{"players":[]}}"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_reports_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        steamy()
            .env("STEAM_API_KEY", "bad-key")
            .env("STEAMY_API_BASE_URL", uri)
            .env("STEAMY_RETRY_DELAY_MS", "1")
            .args(["ping", "--max-retries", "0"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connection test failed"));
    assert!(!stderr.contains("bad-key"));
}
