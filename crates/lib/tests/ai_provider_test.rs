//! # AI Provider Tests
//!
//! Verifies the wire format of both chat providers and their error mapping
//! against an `httpmock` server.

mod common;

use crate::common::setup_tracing;
use drivespot::{
    providers::{
        ai::{anthropic::AnthropicProvider, local::LocalAiProvider, AiProvider},
        factory::{create_provider, ProviderConfig},
    },
    SpotError,
};
use httpmock::{Method, MockServer};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_anthropic_request_shape_and_reply() {
    setup_tracing();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/v1/messages")
            .header("anthropic-version", "2023-06-01")
            .header("x-api-key", "secret")
            .json_body(json!({
                "model": "test-model",
                "max_tokens": 500,
                "system": "あなたはAIです。",
                "messages": [{"role": "user", "content": "候補"}]
            }));
        then.status(200)
            .json_body(json!({"content": [{"type": "text", "text": "{\"spot_ids\": [1]}"}]}));
    });

    let provider = AnthropicProvider::new(
        server.url("/v1/messages"),
        Some("secret".to_string()),
        "test-model".to_string(),
        TIMEOUT,
    )
    .unwrap();
    let reply = provider.generate("あなたはAIです。", "候補", 500).await.unwrap();

    mock.assert();
    assert_eq!(reply, "{\"spot_ids\": [1]}");
}

#[tokio::test]
async fn test_anthropic_empty_content_is_empty_reply() {
    setup_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/v1/messages");
        then.status(200).json_body(json!({"content": []}));
    });

    let provider =
        AnthropicProvider::new(server.url("/v1/messages"), None, "m".to_string(), TIMEOUT).unwrap();
    assert_eq!(provider.generate("", "hi", 10).await.unwrap(), "");
}

#[tokio::test]
async fn test_anthropic_error_mapping() {
    setup_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/fail");
        then.status(529).body("overloaded");
    });
    server.mock(|when, then| {
        when.method(Method::POST).path("/garbage");
        then.status(200).body("not json");
    });

    let failing =
        AnthropicProvider::new(server.url("/fail"), None, "m".to_string(), TIMEOUT).unwrap();
    match failing.generate("", "hi", 10).await {
        Err(SpotError::AiApi(message)) => assert!(message.contains("overloaded")),
        other => panic!("expected AiApi, got {other:?}"),
    }

    let garbage =
        AnthropicProvider::new(server.url("/garbage"), None, "m".to_string(), TIMEOUT).unwrap();
    assert!(matches!(
        garbage.generate("", "hi", 10).await,
        Err(SpotError::AiDeserialization(_))
    ));

    let unreachable = AnthropicProvider::new(
        "http://127.0.0.1:9/v1/messages".to_string(),
        None,
        "m".to_string(),
        TIMEOUT,
    )
    .unwrap();
    assert!(matches!(
        unreachable.generate("", "hi", 10).await,
        Err(SpotError::AiRequest(_))
    ));
}

#[tokio::test]
async fn test_local_provider_request_shape_and_reply() {
    setup_tracing();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer local-key")
            .json_body_partial(
                json!({
                    "model": "local-model",
                    "max_tokens": 600,
                    "messages": [
                        {"role": "system", "content": "sys"},
                        {"role": "user", "content": "user"}
                    ]
                })
                .to_string(),
            );
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "ルートです"}}]
        }));
    });

    let provider = LocalAiProvider::new(
        server.url("/v1/chat/completions"),
        Some("local-key".to_string()),
        Some("local-model".to_string()),
        TIMEOUT,
    )
    .unwrap();
    let reply = provider.generate("sys", "user", 600).await.unwrap();

    mock.assert();
    assert_eq!(reply, "ルートです");
}

#[test]
fn test_factory_rejects_unknown_provider() {
    let config = ProviderConfig {
        provider: "carrier-pigeon".to_string(),
        api_url: "http://localhost".to_string(),
        api_key: None,
        model_name: "m".to_string(),
        timeout_secs: 30,
    };
    assert!(matches!(
        create_provider("default", &config),
        Err(SpotError::UnsupportedAiProvider(_))
    ));

    let anthropic = ProviderConfig {
        provider: "anthropic".to_string(),
        api_key: Some(String::new()),
        ..config
    };
    assert!(create_provider("default", &anthropic).is_ok());
}
