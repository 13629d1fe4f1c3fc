//! Integration tests for the OAuth endpoints and the SID provider,
//! backed by a wiremock gateway.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iolite_api::oauth::{CachedToken, OAuthClient, SidProvider, TokenCache};
use iolite_api::transport::TransportConfig;

// ── Helpers ─────────────────────────────────────────────────────────

fn oauth_client(server: &MockServer) -> OAuthClient {
    let base: Url = server.uri().parse().unwrap();
    OAuthClient::new(
        base,
        "user".into(),
        SecretString::from("pass"),
        &TransportConfig::default(),
    )
    .unwrap()
}

fn token_body() -> serde_json::Value {
    json!({
        "access_token": "token",
        "refresh_token": "refresh-token",
        "token_type": "BEARER",
        "expires_in": 604_799,
    })
}

// ── Token endpoints ─────────────────────────────────────────────────

#[tokio::test]
async fn access_token_exchanges_pairing_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .and(query_param("client_id", "deuwo_mia_app"))
        .and(query_param("grant_type", "authorization_code"))
        .and(query_param("code", "real-code"))
        .and(query_param("name", "my-device"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let token = oauth_client(&server)
        .access_token("real-code", "my-device")
        .await
        .unwrap();

    assert_eq!(token.access_token, "token");
    assert_eq!(token.refresh_token, "refresh-token");
    assert_eq!(token.expires_in, 604_799);
}

#[tokio::test]
async fn access_token_with_bad_credentials_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = oauth_client(&server)
        .access_token("dodgy-code", "my-device")
        .await
        .unwrap_err();

    assert!(err.is_auth_rejected());
}

#[tokio::test]
async fn refresh_uses_refresh_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(query_param("refresh_token", "old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let token = oauth_client(&server).refresh("old-refresh").await.unwrap();
    assert_eq!(token.access_token, "token");
}

#[tokio::test]
async fn sid_endpoint_returns_session_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ui/sid"))
        .and(query_param("access_token", "token"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SID": "session-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let sid = oauth_client(&server).sid("token").await.unwrap();
    assert_eq!(sid, "session-1");
}

// ── SID provider ────────────────────────────────────────────────────

#[tokio::test]
async fn obtain_sid_acquires_and_caches_when_cold() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .and(query_param("grant_type", "authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ui/sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SID": "session-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SidProvider::new(oauth_client(&server), TokenCache::new(dir.path()));
    let sid = provider.obtain_sid("code", "device").await.unwrap();

    assert_eq!(sid, "session-1");
    assert!(dir.path().join("access_token.json").exists());
}

#[tokio::test]
async fn obtain_sid_refreshes_expired_cached_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let expired = CachedToken {
        access_token: "stale".into(),
        refresh_token: "old-refresh".into(),
        token_type: None,
        expires_in: 10,
        expires_at: 0,
    };
    std::fs::write(
        dir.path().join("access_token.json"),
        serde_json::to_string(&expired).unwrap(),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(query_param("refresh_token", "old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ui/sid"))
        .and(query_param("access_token", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SID": "session-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SidProvider::new(oauth_client(&server), TokenCache::new(dir.path()));
    let sid = provider.obtain_sid("code", "device").await.unwrap();

    assert_eq!(sid, "session-2");
}

#[tokio::test]
async fn obtain_sid_retries_once_after_auth_rejection() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Unexpired cached token that the gateway nevertheless rejects.
    let cached = CachedToken {
        access_token: "revoked".into(),
        refresh_token: "old-refresh".into(),
        token_type: None,
        expires_in: 3600,
        expires_at: i64::MAX,
    };
    std::fs::write(
        dir.path().join("access_token.json"),
        serde_json::to_string(&cached).unwrap(),
    )
    .unwrap();

    // First SID attempt: 401. Mounted with a one-use budget so the
    // retry falls through to the success mock below.
    Mock::given(method("GET"))
        .and(path("/ui/sid"))
        .and(query_param("access_token", "revoked"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ui/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ui/sid"))
        .and(query_param("access_token", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SID": "session-3"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SidProvider::new(oauth_client(&server), TokenCache::new(dir.path()));
    let sid = provider.obtain_sid("code", "device").await.unwrap();

    assert_eq!(sid, "session-3");
}
