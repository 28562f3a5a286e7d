//! Anthropic messages API.

use super::error::AdapterError;
use super::http::Call;
use crate::prompt::Prompt;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub(crate) async fn complete(call: &Call<'_>, prompt: &Prompt) -> Result<String, AdapterError> {
    let params = call.params;
    let body = MessagesRequest {
        model: call.model_id,
        max_tokens: params.max_tokens,
        system: &prompt.system,
        messages: vec![Message {
            role: "user",
            content: &prompt.user,
        }],
        temperature: params.temperature,
        top_p: params.top_p,
        top_k: params.top_k,
    };

    let request = call
        .http
        .post(call.endpoint("v1/messages"))
        .header("x-api-key", call.api_key)
        .header("anthropic-version", API_VERSION)
        .json(&body);

    let response: MessagesResponse = call.send(request).await?;
    Ok(response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join(""))
}
