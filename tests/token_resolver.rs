//! Token-exchange integration tests against a local mock endpoint, plus the
//! cache interplay the resolver is built around.

use std::time::{SystemTime, UNIX_EPOCH};

use agents_llm::{
    CachedToken, CopilotConfig, Error, TokenCache, TokenProvenance, TokenResolver,
};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn config_for(server: &mockito::Server, cache_path: std::path::PathBuf) -> CopilotConfig {
    CopilotConfig {
        token_url: Some(format!("{}/token", server.url())),
        github_token: Some("gh-test".to_string()),
        cache_path: Some(cache_path),
        ..CopilotConfig::default()
    }
}

#[test]
fn exchange_fetches_derives_and_caches() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/token")
        .match_header("authorization", "Bearer gh-test")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "proxy-ep=https://proxy.test.example;a=1", "expires_at": 9999999999}"#)
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("token.json");
    let resolver = TokenResolver::new(&config_for(&server, cache_path.clone()));

    let token = resolver.resolve(None).unwrap();
    assert_eq!(token.provenance, TokenProvenance::Fetched);
    assert_eq!(token.value, "proxy-ep=https://proxy.test.example;a=1");
    assert_eq!(token.base_url, "https://api.test.example");
    // Seconds from the endpoint, milliseconds out.
    assert_eq!(token.expires_at_ms, 9_999_999_999_000);

    // Second resolution reuses the cache without touching the network.
    let again = resolver.resolve(None).unwrap();
    assert_eq!(again.provenance, TokenProvenance::Cache);
    assert_eq!(again.value, token.value);
    assert_eq!(again.base_url, token.base_url);
    mock.assert();

    let on_disk = TokenCache::at(cache_path).load().unwrap();
    assert_eq!(on_disk.token, token.value);
    assert_eq!(on_disk.base_url.as_deref(), Some("https://api.test.example"));
}

#[test]
fn millisecond_expiry_is_used_unchanged() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/token")
        .with_status(200)
        .with_body(r#"{"token": "t", "expiresAt": 99999999990000}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let resolver = TokenResolver::new(&config_for(&server, dir.path().join("token.json")));

    let token = resolver.resolve(None).unwrap();
    assert_eq!(token.expires_at_ms, 99_999_999_990_000);
    // No proxy-ep segment in this token: the default origin applies.
    assert_eq!(token.base_url, "https://api.individual.githubcopilot.com");
}

#[test]
fn near_expiry_cache_triggers_fresh_exchange() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/token")
        .with_status(200)
        .with_body(r#"{"token": "fresh-token", "expires_at": 9999999999}"#)
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("token.json");
    // Four minutes left: inside the five-minute margin, so not usable.
    TokenCache::at(&cache_path).store(&CachedToken {
        token: "stale-token".to_string(),
        expires_at: now_ms() + 4 * 60 * 1000,
        updated_at: now_ms(),
        base_url: None,
    });

    let resolver = TokenResolver::new(&config_for(&server, cache_path));
    let token = resolver.resolve(None).unwrap();
    assert_eq!(token.provenance, TokenProvenance::Fetched);
    assert_eq!(token.value, "fresh-token");
    mock.assert();
}

#[test]
fn usable_cache_is_served_without_any_network_call() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/token").expect(0).create();

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("token.json");
    TokenCache::at(&cache_path).store(&CachedToken {
        token: "proxy-ep=proxy.cached.example".to_string(),
        expires_at: now_ms() + 60 * 60 * 1000,
        updated_at: now_ms(),
        // Base URL re-derived from the token when the record has none.
        base_url: None,
    });

    let resolver = TokenResolver::new(&config_for(&server, cache_path));
    let token = resolver.resolve(None).unwrap();
    assert_eq!(token.provenance, TokenProvenance::Cache);
    assert_eq!(token.base_url, "https://api.cached.example");
    mock.assert();
}

#[test]
fn explicit_credential_takes_priority() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/token")
        .match_header("authorization", "Bearer explicit-cred")
        .with_status(200)
        .with_body(r#"{"token": "t", "expires_at": 9999999999}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let resolver = TokenResolver::new(&config_for(&server, dir.path().join("token.json")));
    resolver.resolve(Some("explicit-cred")).unwrap();
    mock.assert();
}

#[test]
fn missing_credential_fails_before_the_network() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/token").expect(0).create();

    let dir = tempfile::tempdir().unwrap();
    let config = CopilotConfig {
        token_url: Some(format!("{}/token", server.url())),
        github_token: None,
        cache_path: Some(dir.path().join("token.json")),
        ..CopilotConfig::default()
    };

    let err = TokenResolver::new(&config).resolve(None).unwrap_err();
    assert!(matches!(err, Error::MissingCredential));
    mock.assert();
}

#[test]
fn non_success_exchange_status_is_surfaced() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/token")
        .with_status(403)
        .with_body("forbidden")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let resolver = TokenResolver::new(&config_for(&server, dir.path().join("token.json")));
    let err = resolver.resolve(None).unwrap_err();
    assert!(matches!(err, Error::ExchangeFailed { status: 403 }));
}

#[test]
fn malformed_exchange_body_is_rejected() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/token")
        .with_status(200)
        .with_body(r#"{"token": "", "expires_at": 9999999999}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let resolver = TokenResolver::new(&config_for(&server, dir.path().join("token.json")));
    let err = resolver.resolve(None).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[test]
fn cache_write_failure_does_not_fail_the_exchange() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/token")
        .with_status(200)
        .with_body(r#"{"token": "t", "expires_at": 9999999999}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    // A directory at the cache path makes the write fail.
    let cache_path = dir.path().join("token.json");
    std::fs::create_dir_all(&cache_path).unwrap();

    let resolver = TokenResolver::new(&config_for(&server, cache_path));
    let token = resolver.resolve(None).unwrap();
    assert_eq!(token.provenance, TokenProvenance::Fetched);
}
