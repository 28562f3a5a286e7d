//! OpenAI chat completions, also spoken by Upstage and Perplexity.

use super::error::AdapterError;
use super::http::{Call, ChatFlavor};
use crate::prompt::{JsonStyle, Prompt};
use serde::{Deserialize, Serialize};

/// Model families that reject `temperature`, `top_p` and `max_tokens`
const REASONING_PREFIXES: &[&str] = &["gpt-5", "o1", "o3", "o4"];

pub(crate) fn is_reasoning_model(model_id: &str) -> bool {
    let id = model_id.to_ascii_lowercase();
    REASONING_PREFIXES.iter().any(|prefix| id.starts_with(prefix))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(
    call: &Call<'a>,
    flavor: ChatFlavor,
    prompt: &'a Prompt,
    style: JsonStyle,
) -> ChatRequest<'a> {
    let params = call.params;
    let reasoning = flavor == ChatFlavor::OpenAi && is_reasoning_model(call.model_id);

    ChatRequest {
        model: call.model_id,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
        max_tokens: (!reasoning).then_some(params.max_tokens),
        max_completion_tokens: reasoning.then_some(params.max_tokens),
        temperature: (!reasoning).then_some(params.temperature),
        top_p: if reasoning { None } else { params.top_p },
        top_k: if flavor == ChatFlavor::Perplexity {
            params.top_k
        } else {
            None
        },
        response_format: (style == JsonStyle::Native).then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

pub(crate) async fn complete(
    call: &Call<'_>,
    flavor: ChatFlavor,
    prompt: &Prompt,
    style: JsonStyle,
) -> Result<String, AdapterError> {
    let body = build_request(call, flavor, prompt, style);
    let request = call
        .http
        .post(call.endpoint("chat/completions"))
        .bearer_auth(call.api_key)
        .json(&body);

    let response: ChatResponse = call.send(request).await?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(AdapterError::EmptyResponse)
}
