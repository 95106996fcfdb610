//! Ollama client tests against a mocked HTTP server.

#![cfg(feature = "ollama")]

use ragkit::llm::{LLMClient, OllamaClient};
use ragkit::types::{AppError, ErrorKind};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a mock Ollama chat completion response
fn mock_chat_response(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3",
        "created_at": "2024-01-01T00:00:00Z",
        "message": {
            "role": "assistant",
            "content": content
        },
        "done": true,
        "total_duration": 1000,
        "load_duration": 10,
        "prompt_eval_count": 5,
        "prompt_eval_duration": 100,
        "eval_count": 7,
        "eval_duration": 200
    })
}

#[tokio::test]
async fn test_generate_returns_message_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "llama3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_chat_response("Paris.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OllamaClient::new(mock_server.uri(), "llama3".to_string()).unwrap();
    assert_eq!(client.model_name(), "llama3");

    let answer = client.generate("What is the capital of France?").await.unwrap();
    assert_eq!(answer, "Paris.");
}

#[tokio::test]
async fn test_server_error_is_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let client = OllamaClient::new(mock_server.uri(), "llama3".to_string()).unwrap();
    let err = client.generate("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    match err {
        AppError::UpstreamGeneration { passages, .. } => assert!(passages.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_upstream() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = OllamaClient::new("http://127.0.0.1:9".to_string(), "llama3".to_string()).unwrap();
    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamGeneration { .. }));
}

#[test]
fn test_bad_base_url_is_configuration() {
    let err = OllamaClient::new("http://host:port".to_string(), "llama3".to_string()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
