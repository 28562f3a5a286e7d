//! HTTP-backed adapter shared by every provider.
//!
//! `Backend` selects the wire protocol; the request/response shapes live in
//! the provider modules. This file owns the client, retries, timing and the
//! translation of raw text into a `ModelResponse`.

use super::anthropic;
use super::error::AdapterError;
use super::google;
use super::openai;
use super::{GenerationParams, ModelAdapter};
use crate::extraction::{extract_answer, ExtractionMethod};
use crate::prompt::{JsonStyle, Prompt, PromptBuilder, SolveRequest};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use exam_bench_common::{retry_transient, RetryConfig};
use exam_bench_domain::{ModelResponse, ModelSpec, Provider};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// Flavors of the OpenAI chat completions protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFlavor {
    OpenAi,
    Upstage,
    Perplexity,
}

/// Wire protocol for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `POST {base}/chat/completions`
    ChatCompletions(ChatFlavor),
    /// `POST {base}/v1/messages`
    Messages,
    /// `POST {base}/v1beta/models/{id}:generateContent`
    GenerateContent,
}

impl Backend {
    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::OpenAi => Self::ChatCompletions(ChatFlavor::OpenAi),
            Provider::Upstage => Self::ChatCompletions(ChatFlavor::Upstage),
            Provider::Perplexity => Self::ChatCompletions(ChatFlavor::Perplexity),
            Provider::Anthropic => Self::Messages,
            Provider::Google => Self::GenerateContent,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::ChatCompletions(ChatFlavor::OpenAi) => "https://api.openai.com/v1",
            Self::ChatCompletions(ChatFlavor::Upstage) => "https://api.upstage.ai/v1/solar",
            Self::ChatCompletions(ChatFlavor::Perplexity) => "https://api.perplexity.ai",
            Self::Messages => "https://api.anthropic.com",
            Self::GenerateContent => "https://generativelanguage.googleapis.com",
        }
    }

    /// Whether JSON output is enforced by the API or only asked for in the prompt
    pub fn json_style(&self, model_id: &str) -> JsonStyle {
        match self {
            Self::ChatCompletions(ChatFlavor::OpenAi) if !openai::is_reasoning_model(model_id) => {
                JsonStyle::Native
            }
            Self::GenerateContent if !google::is_gemma(model_id) => JsonStyle::Native,
            _ => JsonStyle::PromptOnly,
        }
    }
}

/// Connection details handed to the provider modules
pub(crate) struct Call<'a> {
    pub http: &'a reqwest::Client,
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub model_id: &'a str,
    pub params: &'a GenerationParams,
}

impl Call<'_> {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn timeout_secs(&self) -> u64 {
        self.params.timeout.as_secs()
    }

    /// Send a request and decode a JSON body, mapping every failure
    pub async fn send<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, AdapterError> {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(e, self.timeout_secs()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::from_reqwest(e, self.timeout_secs()))?;

        if !status.is_success() {
            return Err(AdapterError::status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| AdapterError::MalformedResponse(e.to_string()))
    }
}

/// Adapter for one registry model over HTTP
pub struct HttpAdapter {
    spec: ModelSpec,
    backend: Backend,
    base_url: String,
    api_key: String,
    params: GenerationParams,
    prompts: PromptBuilder,
    retry: RetryConfig,
    http: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(
        spec: ModelSpec,
        backend: Backend,
        api_key: String,
        params: GenerationParams,
        prompts: PromptBuilder,
        retry: RetryConfig,
    ) -> ApplicationResult<Self> {
        let base_url = match &spec.base_url {
            Some(url) => url.as_str().to_string(),
            None => Url::parse(backend.default_base_url())
                .map_err(|e| ApplicationError::Configuration(e.to_string()))?
                .as_str()
                .to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("exam-bench/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .timeout(params.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ApplicationError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            spec,
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            params,
            prompts,
            retry,
            http,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    async fn complete(&self, prompt: &Prompt, style: JsonStyle) -> Result<String, AdapterError> {
        let call = Call {
            http: &self.http,
            base_url: &self.base_url,
            api_key: &self.api_key,
            model_id: &self.spec.model_id,
            params: &self.params,
        };

        let text = match self.backend {
            Backend::ChatCompletions(flavor) => openai::complete(&call, flavor, prompt, style).await?,
            Backend::Messages => anthropic::complete(&call, prompt).await?,
            Backend::GenerateContent => google::complete(&call, prompt, style).await?,
        };

        if text.trim().is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl ModelAdapter for HttpAdapter {
    fn model_name(&self) -> &str {
        &self.spec.name
    }

    #[instrument(
        skip(self, request),
        fields(model = %self.spec.name, model_id = %self.spec.model_id, kind = ?request.kind)
    )]
    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse {
        let started = Instant::now();
        let style = self.backend.json_style(&self.spec.model_id);
        let prompt = self.prompts.build(request, style);

        let outcome = retry_transient(&self.retry, || self.complete(&prompt, style)).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(text) => interpret_output(&self.spec.name, request, text, elapsed),
            Err(error) => {
                warn!(
                    error = %error,
                    code = error.error_code(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Model call failed"
                );
                ModelResponse::failed(&self.spec.name, error.to_string(), "", elapsed)
            }
        }
    }
}

/// Turn raw model text into a response via the extraction pipeline
pub(crate) fn interpret_output(
    model_name: &str,
    request: &SolveRequest<'_>,
    text: String,
    elapsed: Duration,
) -> ModelResponse {
    match extract_answer(&text, request.kind) {
        Some(extraction) => {
            debug!(
                answer = %extraction.answer,
                method = ?extraction.method,
                repaired = extraction.repaired,
                elapsed_ms = elapsed.as_millis() as u64,
                "Extracted answer"
            );
            let reasoning = match extraction.method {
                ExtractionMethod::Heuristic => text.clone(),
                _ => extraction.reasoning.unwrap_or_default(),
            };
            ModelResponse::answered(model_name, extraction.answer, reasoning, text, elapsed)
        }
        None => {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "No valid answer in model output"
            );
            let error = match request.kind {
                exam_bench_domain::AnswerKind::MultipleChoice => {
                    "No valid answer (1-5) found in model output"
                }
                exam_bench_domain::AnswerKind::FreeResponse => {
                    "No numeric answer found in model output"
                }
            };
            ModelResponse::failed(model_name, error, text.clone(), elapsed).with_reasoning(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_bench_domain::Answer;

    #[test]
    fn test_backend_selection() {
        assert_eq!(
            Backend::for_provider(Provider::Upstage),
            Backend::ChatCompletions(ChatFlavor::Upstage)
        );
        assert_eq!(Backend::for_provider(Provider::Google), Backend::GenerateContent);
        assert_eq!(
            Backend::Messages.default_base_url(),
            "https://api.anthropic.com"
        );
    }

    #[test]
    fn test_json_style_per_family() {
        let openai = Backend::ChatCompletions(ChatFlavor::OpenAi);
        assert_eq!(openai.json_style("gpt-4o"), JsonStyle::Native);
        assert_eq!(openai.json_style("gpt-5-mini"), JsonStyle::PromptOnly);
        assert_eq!(openai.json_style("o3"), JsonStyle::PromptOnly);

        let upstage = Backend::ChatCompletions(ChatFlavor::Upstage);
        assert_eq!(upstage.json_style("solar-pro2"), JsonStyle::PromptOnly);

        assert_eq!(Backend::GenerateContent.json_style("gemini-2.5-pro"), JsonStyle::Native);
        assert_eq!(Backend::GenerateContent.json_style("gemma-3-27b-it"), JsonStyle::PromptOnly);
        assert_eq!(Backend::Messages.json_style("claude-sonnet-4-5"), JsonStyle::PromptOnly);
    }

    #[test]
    fn test_interpret_output_failure_keeps_raw_text() {
        let choices = vec!["a".to_string(); 5];
        let request = SolveRequest::new("q", &choices, None);

        let response = interpret_output("m", &request, "I am not sure.".into(), Duration::ZERO);

        assert!(!response.success);
        assert_eq!(response.answer, None);
        assert_eq!(response.raw_response, "I am not sure.");
        assert_eq!(response.reasoning, "I am not sure.");
    }

    #[test]
    fn test_interpret_output_uses_json_reasoning() {
        let choices = vec!["a".to_string(); 5];
        let request = SolveRequest::new("q", &choices, None);
        let raw = r#"{"answer": 4, "reasoning": "because"}"#;

        let response = interpret_output("m", &request, raw.into(), Duration::from_secs(2));

        assert!(response.success);
        assert_eq!(response.answer, Some(Answer::Choice(4)));
        assert_eq!(response.reasoning, "because");
        assert_eq!(response.time_taken, 2.0);
    }
}
