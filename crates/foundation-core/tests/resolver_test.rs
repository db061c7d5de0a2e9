#![allow(clippy::unwrap_used)]
// Cached reads against a wiremock server, with the push channel disabled.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foundation_core::{ClientConfig, CoreError, Foundation, RealtimeConfig, VariableSlot};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(
        Url::parse(&server.uri()).unwrap(),
        SecretString::from("test-key"),
    )
    .with_realtime(RealtimeConfig::disabled())
}

fn client(server: &MockServer) -> Foundation {
    Foundation::new(config(server)).unwrap()
}

async fn mount_configuration(server: &MockServer, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/configuration"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

// ── Lazy population ─────────────────────────────────────────────────

#[tokio::test]
async fn test_configuration_fetched_once() {
    let server = MockServer::start().await;
    mount_configuration(&server, r#"{"content":"{\"theme\":\"dark\"}"}"#, 1).await;

    let client = client(&server);
    assert!(client.store().configuration().await.is_none());

    let first = client.get_configuration().await.unwrap();
    let second = client.get_configuration().await.unwrap();

    assert_eq!(first, json!({ "theme": "dark" }));
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_environment_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"prod"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.get_environment().await.unwrap(), json!({ "name": "prod" }));
    assert_eq!(client.get_environment().await.unwrap(), json!({ "name": "prod" }));
    assert_eq!(client.store().environment().await, Some(json!({ "name": "prod" })));
}

#[tokio::test]
async fn test_null_environment_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.get_environment().await.unwrap(), serde_json::Value::Null);
    assert_eq!(client.get_environment().await.unwrap(), serde_json::Value::Null);
}

#[tokio::test]
async fn test_configuration_plain_string_content() {
    let server = MockServer::start().await;
    mount_configuration(&server, r#"{"content":"not json at all"}"#, 1).await;

    let client = client(&server);
    assert_eq!(client.get_configuration().await.unwrap(), json!("not json at all"));
}

#[tokio::test]
async fn test_configuration_without_content_not_cached() {
    let server = MockServer::start().await;
    mount_configuration(&server, "{}", 2).await;

    let client = client(&server);
    assert_eq!(client.get_configuration().await.unwrap(), serde_json::Value::Null);
    assert!(client.store().configuration().await.is_none());
    assert_eq!(client.get_configuration().await.unwrap(), serde_json::Value::Null);
}

#[tokio::test]
async fn test_invalidation_forces_refetch() {
    let server = MockServer::start().await;
    mount_configuration(&server, r#"{"content":"{}"}"#, 2).await;

    let client = client(&server);
    client.get_configuration().await.unwrap();
    client.store().invalidate_configuration().await;
    client.get_configuration().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/configuration"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"content":"{\"n\":1}"}"#)
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let (a, b) = tokio::join!(client.get_configuration(), client.get_configuration());
    assert_eq!(a.unwrap(), json!({ "n": 1 }));
    assert_eq!(b.unwrap(), json!({ "n": 1 }));
}

// ── Variables ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_variable_cached_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .and(body_json(json!({ "name": "banner" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"name":"banner","value":"hello"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let value = client.get_variable("banner", None, None).await.unwrap();
    assert_eq!(value, Some(json!("hello")));
    let value = client.get_variable("banner", None, None).await.unwrap();
    assert_eq!(value, Some(json!("hello")));

    match client.store().variable("banner").await {
        VariableSlot::Cached(entry) => assert_eq!(entry.get("name"), Some(&json!("banner"))),
        other => panic!("expected cached entry, got {other:?}"),
    }
}

#[tokio::test]
async fn test_variable_not_found_returns_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let value = client
        .get_variable("missing", None, Some(json!(false)))
        .await
        .unwrap();
    assert_eq!(value, Some(json!(false)));

    // Nothing cached: the next call asks again.
    let value = client.get_variable("missing", None, None).await.unwrap();
    assert_eq!(value, None);
    assert_eq!(client.store().variable("missing").await, VariableSlot::Vacant);
    assert_eq!(client.store().variable_count(), 0);
}

#[tokio::test]
async fn test_variable_uid_precedence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .and(body_json(json!({ "name": "a", "uid": "default-user" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":1}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .and(body_json(json!({ "name": "b", "uid": "override" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":2}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = Foundation::new(config(&server).with_uid("default-user")).unwrap();
    assert_eq!(client.get_variable("a", None, None).await.unwrap(), Some(json!(1)));
    assert_eq!(
        client.get_variable("b", Some("override"), None).await.unwrap(),
        Some(json!(2))
    );
}

#[tokio::test]
async fn test_variable_entry_without_value() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"x"}"#))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.get_variable("x", None, Some(json!(1))).await.unwrap(), None);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_remote_error_message_is_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/configuration"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.get_configuration().await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.status(), Some(500));
    assert!(client.store().configuration().await.is_none());
}

#[tokio::test]
async fn test_environment_remote_error_message_is_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/environment"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.get_environment().await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.status(), Some(500));
    assert!(client.store().environment().await.is_none());
}

#[tokio::test]
async fn test_variable_remote_error_message_is_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .get_variable("flag", None, Some(json!(true)))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.status(), Some(500));
    assert_eq!(client.store().variable("flag").await, VariableSlot::Vacant);
    assert_eq!(client.store().variable_count(), 0);
}

#[tokio::test]
async fn test_variable_server_error_is_not_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/variable"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .get_variable("x", None, Some(json!("fallback")))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Remote { status: 401, .. }), "got {err:?}");
    assert_eq!(err.to_string(), "bad key");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    mount_configuration(&server, "<html>", 1).await;

    let client = client(&server);
    match client.get_configuration().await.unwrap_err() {
        CoreError::Decode { body, .. } => assert_eq!(body, "<html>"),
        other => panic!("expected Decode, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = ClientConfig::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        SecretString::from("k"),
    )
    .with_realtime(RealtimeConfig::disabled());
    let client = Foundation::new(config).unwrap();

    let err = client.get_environment().await.unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unsupported_scheme_rejected_at_construction() {
    let config = ClientConfig::new(
        Url::parse("ftp://flags.example.com").unwrap(),
        SecretString::from("k"),
    );
    let err = Foundation::new(config).err().unwrap();
    assert!(matches!(err, CoreError::Config { .. }), "got {err:?}");
}
