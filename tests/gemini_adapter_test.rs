//! Wire-level tests for the Gemini adapter against a mock server.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wayfinder::providers::GeminiAdapter;
use wayfinder::{Message, ModelConfig, ProviderAdapter, ProviderId, WayfinderError};

const TIMEOUT: Duration = Duration::from_secs(5);

fn adapter(server: &MockServer) -> GeminiAdapter {
    GeminiAdapter::with_base_url("test-key", reqwest::Client::new(), server.uri())
}

fn config() -> ModelConfig {
    ModelConfig::default_for(ProviderId::Gemini)
}

fn success_body(text: &str) -> Value {
    json!({
        "candidates": [
            {"content": {"role": "model", "parts": [{"text": text}]}}
        ]
    })
}

#[tokio::test]
async fn sends_expected_wire_format_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        Message::user("Where should I go in May?"),
        Message::assistant("Lisbon is lovely in May."),
    ];
    let text = adapter(&server)
        .send(
            "Plan three days there.",
            &history,
            Some("You are a travel assistant."),
            &config(),
            TIMEOUT,
        )
        .await
        .unwrap();
    assert_eq!(text, "Hi there");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    // System prompt first, history in order, the prompt as the final user turn.
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        "You are a travel assistant."
    );
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["text"], "Plan three days there.");

    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    assert!(body["generationConfig"]["temperature"].is_number());
}

#[tokio::test]
async fn omits_system_instruction_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ok")))
        .mount(&server)
        .await;

    adapter(&server)
        .send("Hello", &[], None, &config(), TIMEOUT)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("systemInstruction").is_none());
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .send("Hello", &[], None, &config(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WayfinderError::AuthenticationFailed { status: 401 }
    ));
}

#[tokio::test]
async fn rate_limit_carries_retry_after_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .send("Hello", &[], None, &config(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WayfinderError::RateLimited {
            retry_after: Some(d)
        } if d == Duration::from_secs(2)
    ));
}

#[tokio::test]
async fn api_errors_preserve_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "invalid model"}})),
        )
        .mount(&server)
        .await;

    let err = adapter(&server)
        .send("Hello", &[], None, &config(), TIMEOUT)
        .await
        .unwrap_err();
    match err {
        WayfinderError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid model");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn reply_without_text_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .send("Hello", &[], None, &config(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, WayfinderError::EmptyResponse));
}
