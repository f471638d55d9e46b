//! Integration tests for the Veltro merchant client.

use std::sync::{Arc, Mutex};
use veltro::{ClientConfig, MerchantClient, VeltroError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP_TOKEN: &str = "test_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f";

fn mock_client(server: &MockServer) -> MerchantClient {
    MerchantClient::with_config(
        APP_TOKEN,
        "en",
        "Europe/Warsaw",
        ClientConfig {
            base_url: Some(server.uri()),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_client_creation_with_generated_tokens() {
    for prefix in ["", "test_", "prod_"] {
        let token = format!("{prefix}{}", uuid::Uuid::new_v4());
        let client = MerchantClient::new(&token, "en", "Europe/Warsaw");
        assert!(client.is_ok(), "token {token} should be accepted");
    }
}

#[tokio::test]
async fn test_default_headers_sent_with_every_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .and(header("Accept", "application/json"))
        .and(header("X-API-Token", APP_TOKEN))
        .and(header("X-API-Language", "en"))
        .and(header("X-API-Timezone", "Europe/Warsaw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "payouts": []
        })))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let payouts = client.payouts().listing().await.unwrap();
    assert_eq!(payouts["httpCode"], 200);
}

#[tokio::test]
async fn test_client_ip_header_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .and(header("X-Client-IP", "203.0.113.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = MerchantClient::with_config(
        APP_TOKEN,
        "en",
        "Europe/Warsaw",
        ClientConfig {
            base_url: Some(mock_server.uri()),
            client_ip: Some("203.0.113.7".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    assert!(client.payouts().listing().await.is_ok());
}

#[tokio::test]
async fn test_auth_stores_and_returns_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("login=merchant"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "sess-1"
        })))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let token = client.auth("merchant", "s3cret").await.unwrap();

    assert_eq!(token, "sess-1");
    assert_eq!(client.auth_token().as_deref(), Some("sess-1"));
}

#[tokio::test]
async fn test_auth_error_carries_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "401",
            "message": "API token invalid"
        })))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let err = client.auth("merchant", "wrong").await.unwrap_err();

    match err {
        VeltroError::Auth {
            message, http_code, ..
        } => {
            assert!(message.contains("API token invalid"));
            assert_eq!(http_code, 401);
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_error_from_errors_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{"message": "account is locked"}]
        })))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let err = client.auth("merchant", "s3cret").await.unwrap_err();

    match err {
        VeltroError::Auth { message, .. } => assert!(message.contains("account is locked")),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_2xx_response_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "message": "internal error"
        })))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let err = client.payouts().listing().await.unwrap_err();

    match err {
        VeltroError::Api { http_code, body } => {
            assert_eq!(http_code, 500);
            assert!(body.contains("internal error"));
            assert!(body.contains("\"httpCode\":500"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_token_attached_once_authenticated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .and(header("X-Auth-Token", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    client.set_auth_token("sess-1").unwrap();

    assert!(client.payouts().listing().await.is_ok());
}

#[tokio::test]
async fn test_rotated_session_token_adopted_transparently() {
    let mock_server = MockServer::start().await;

    // First response rotates the session token via a response header...
    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .and(header("X-Auth-Token", "sess-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .insert_header("X-Auth-Token", "sess-2"),
        )
        .mount(&mock_server)
        .await;

    // ...and the next request must already carry the rotated token.
    Mock::given(method("GET"))
        .and(path("/v1/accounts/"))
        .and(header("X-Auth-Token", "sess-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    client.set_auth_token("sess-1").unwrap();

    let renewed = Arc::new(Mutex::new(Vec::new()));
    let renewed_by_listener = Arc::clone(&renewed);
    client.on_token_renewal(move |token| {
        renewed_by_listener.lock().unwrap().push(token.to_string());
    });

    client.payouts().listing().await.unwrap();
    assert_eq!(client.auth_token().as_deref(), Some("sess-2"));

    client.accounts().listing().await.unwrap();
    assert_eq!(*renewed.lock().unwrap(), vec!["sess-2"]);
}

#[tokio::test]
async fn test_trace_log_appended_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "payouts": []
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("api-trace.log");

    let mut client = mock_client(&mock_server);
    client.enable_logging(&log_path);
    client.payouts().listing().await.unwrap();

    let trace = std::fs::read_to_string(&log_path).unwrap();
    assert!(trace.contains("> GET"));
    assert!(trace.contains("< HTTP 200"));

    client.disable_logging();
    client.payouts().listing().await.unwrap();
    assert_eq!(std::fs::read_to_string(&log_path).unwrap(), trace);
}
