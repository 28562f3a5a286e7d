//! Tests for provider adapters against mock HTTP servers
//!
//! Each provider's request shape, authentication and response parsing is
//! exercised through `build_adapter`, along with retry and timeout handling.

use exam_bench_application::{build_adapter, AdapterSettings, ModelAdapter, PromptBuilder, SolveRequest};
use exam_bench_common::{GenerationConfig, StaticCredentials};
use exam_bench_domain::{Answer, ModelSpec, Provider};
use exam_bench_testing::wiremock::matchers::{header, method, path};
use exam_bench_testing::wiremock::{Mock, MockServer, ResponseTemplate};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn settings(max_retries: u32) -> AdapterSettings {
    let generation = GenerationConfig {
        max_retries,
        retry_initial_delay_ms: 10,
        ..GenerationConfig::default()
    };
    AdapterSettings::new(generation, PromptBuilder::default())
}

fn adapter_for(server: &MockServer, provider: Provider, model_id: &str, max_retries: u32) -> Arc<dyn ModelAdapter> {
    let mut spec = ModelSpec::new("under-test", provider, model_id);
    spec.base_url = Some(Url::parse(&server.uri()).unwrap());
    spec.timeout = Some(2);
    let credentials = StaticCredentials::new().with_key(provider, "test-key");
    build_adapter(&spec, &credentials, &settings(max_retries)).unwrap()
}

fn choices() -> Vec<String> {
    (1..=5).map(|i| format!("선택지 {}", i)).collect()
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let request = requests.last().unwrap();
    serde_json::from_slice(&request.body).unwrap()
}

fn chat_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

// ============================================================================
// Chat Completions
// ============================================================================

#[tokio::test]
async fn test_openai_chat_completion() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"answer": 4, "reasoning": "넷째 선택지가 맞다."}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-4o", 0);
    let choices = choices();

    // Act
    let response = adapter
        .solve(&SolveRequest::new("다음 중 옳은 것은?", &choices, Some("지문")))
        .await;

    // Assert
    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.answer, Some(Answer::Choice(4)));
    assert_eq!(response.reasoning, "넷째 선택지가 맞다.");
    assert_eq!(response.model_name, "under-test");

    let body = last_body(&server).await;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"].as_str().unwrap().contains("지문"));
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["max_tokens"], 2000);
    assert_eq!(body["temperature"], 0.1);
}

#[tokio::test]
async fn test_reasoning_model_request_shape() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"answer": 1, "reasoning": "r"}"#)))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-5-mini", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert_eq!(response.answer, Some(Answer::Choice(1)));
    let body = last_body(&server).await;
    assert_eq!(body["max_completion_tokens"], 2000);
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("temperature").is_none());
    assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn test_upstage_prompt_only_json() {
    // Arrange - the reply wraps its JSON in prose
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "분석 결과는 다음과 같습니다.\n```json\n{\"answer\": 2, \"reasoning\": \"둘째\"}\n```",
        )))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Upstage, "solar-pro2", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert_eq!(response.answer, Some(Answer::Choice(2)));
    let body = last_body(&server).await;
    assert!(body.get("response_format").is_none());
    assert!(body.get("top_k").is_none());
}

#[tokio::test]
async fn test_free_response_answer() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"answer": 12.5, "reasoning": "계산"}"#)))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Perplexity, "sonar-pro", 0);

    // Act
    let response = adapter.solve(&SolveRequest::new("값을 구하시오.", &[], None)).await;

    // Assert
    assert_eq!(response.answer, Some(Answer::Numeric(12.5)));
}

// ============================================================================
// Messages and Generate Content
// ============================================================================

#[tokio::test]
async fn test_anthropic_messages() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "text", "text": "{\"answer\": 5, " },
                { "type": "text", "text": "\"reasoning\": \"다섯째\"}" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Anthropic, "claude-sonnet-4-5", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert_eq!(response.answer, Some(Answer::Choice(5)));
    let body = last_body(&server).await;
    assert!(body["system"].as_str().is_some());
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["max_tokens"], 2000);
}

#[tokio::test]
async fn test_google_generate_content() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"answer\": 3, \"reasoning\": \"셋째\"}" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Google, "gemini-2.5-pro", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert_eq!(response.answer, Some(Answer::Choice(3)));
    let body = last_body(&server).await;
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_google_blocked_prompt() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Google, "gemini-2.5-pro", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert!(!response.success);
    assert!(response.error.unwrap().contains("SAFETY"));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_server_error_retried_then_failed() {
    // Arrange - one attempt plus two retries
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-4o", 2);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert!(!response.success);
    assert_eq!(response.answer, None);
    assert_eq!(
        response.error.as_deref(),
        Some("Provider returned HTTP 503: overloaded")
    );
}

#[tokio::test]
async fn test_client_error_not_retried() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .expect(1)
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::Anthropic, "claude-sonnet-4-5", 2);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert!(!response.success);
    assert!(response.error.unwrap().contains("401"));
}

#[tokio::test]
async fn test_timeout_becomes_failed_response() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"answer": 1, "reasoning": "late"}"#))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-4o", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Request timed out after 2s"));
    assert!(response.time_taken >= 2.0);
}

#[tokio::test]
async fn test_unparseable_output_keeps_raw_text() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("잘 모르겠습니다.")))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-4o", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert!(!response.success);
    assert_eq!(response.raw_response, "잘 모르겠습니다.");
    assert_eq!(
        response.error.as_deref(),
        Some("No valid answer (1-5) found in model output")
    );
}

#[tokio::test]
async fn test_empty_choices_list_is_empty_response() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    let adapter = adapter_for(&server, Provider::OpenAi, "gpt-4o", 0);
    let choices = choices();

    // Act
    let response = adapter.solve(&SolveRequest::new("문제", &choices, None)).await;

    // Assert
    assert_eq!(response.error.as_deref(), Some("Model returned an empty response"));
}
