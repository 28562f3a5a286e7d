//! Google Gemini `generateContent`.
//!
//! Gemma models served through the same endpoint reject both the system
//! instruction and JSON mode, so their system text is inlined into the user
//! turn.

use super::error::AdapterError;
use super::http::Call;
use crate::prompt::{JsonStyle, Prompt};
use serde::{Deserialize, Serialize};

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub(crate) fn is_gemma(model_id: &str) -> bool {
    model_id.to_ascii_lowercase().starts_with("gemma")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn text_content(role: Option<&str>, text: String) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part { text: Some(text) }],
    }
}

fn build_request(call: &Call<'_>, prompt: &Prompt, style: JsonStyle) -> GenerateRequest {
    let params = call.params;
    let gemma = is_gemma(call.model_id);

    let (user_text, system_instruction) = if gemma {
        (prompt.inline(), None)
    } else {
        (prompt.user.clone(), Some(text_content(None, prompt.system.clone())))
    };

    GenerateRequest {
        contents: vec![text_content(Some("user"), user_text)],
        system_instruction,
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
            top_p: params.top_p,
            top_k: params.top_k,
            response_mime_type: (style == JsonStyle::Native && !gemma).then_some("application/json"),
        },
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: "BLOCK_NONE",
            })
            .collect(),
    }
}

pub(crate) async fn complete(
    call: &Call<'_>,
    prompt: &Prompt,
    style: JsonStyle,
) -> Result<String, AdapterError> {
    let body = build_request(call, prompt, style);
    let path = format!("v1beta/models/{}:generateContent", call.model_id);
    let request = call
        .http
        .post(call.endpoint(&path))
        .header("x-goog-api-key", call.api_key)
        .json(&body);

    let response: GenerateResponse = call.send(request).await?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(AdapterError::MalformedResponse(format!(
            "Gemini returned no candidates ({})",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r != "STOP") {
            return Err(AdapterError::MalformedResponse(format!(
                "Gemini stopped without text ({})",
                reason
            )));
        }
    }
    Ok(text)
}
