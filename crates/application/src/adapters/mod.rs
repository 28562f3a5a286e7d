//! Model adapters - one shared "solve one question" capability over several
//! provider wire protocols.
//!
//! An adapter never fails outward: transport errors, timeouts, provider
//! rejections and unusable output all come back as a `ModelResponse` with
//! `success == false` and the elapsed time up to the failure.

mod anthropic;
mod error;
mod google;
mod http;
mod openai;

pub use error::AdapterError;
pub use http::{Backend, ChatFlavor, HttpAdapter};

use crate::prompt::{PromptBuilder, SolveRequest};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use exam_bench_common::{CredentialSource, GenerationConfig, RetryConfig};
use exam_bench_domain::{ModelResponse, ModelSpec};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Anything that can answer one exam question
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Registry name of the backing model
    fn model_name(&self) -> &str;

    /// Answer one question. Never panics on provider errors and never
    /// returns an error; failures are encoded in the response.
    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse;
}

/// Generation parameters after applying per-model overrides
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
}

impl GenerationParams {
    /// Registry values win; the generation config fills the gaps
    pub fn resolve(spec: &ModelSpec, defaults: &GenerationConfig) -> Self {
        Self {
            max_tokens: spec.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: spec.temperature.unwrap_or(defaults.temperature),
            timeout: spec
                .timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| defaults.timeout()),
            top_p: spec.top_p,
            top_k: spec.top_k,
        }
    }
}

/// Everything adapters share within one evaluation session
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub generation: GenerationConfig,
    pub prompts: PromptBuilder,
}

impl AdapterSettings {
    pub fn new(generation: GenerationConfig, prompts: PromptBuilder) -> Self {
        Self {
            generation,
            prompts,
        }
    }

    pub fn retry(&self) -> RetryConfig {
        self.generation.retry_config()
    }
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::new(GenerationConfig::default(), PromptBuilder::default())
    }
}

/// Build the adapter for a registry entry.
///
/// Fails with `Configuration` for an unknown provider and with
/// `MissingCredential` when the provider's API key is not set; callers
/// evaluating many models skip that one model and continue.
pub fn build_adapter(
    spec: &ModelSpec,
    credentials: &dyn CredentialSource,
    settings: &AdapterSettings,
) -> ApplicationResult<Arc<dyn ModelAdapter>> {
    let provider = spec
        .provider_kind()
        .map_err(|e| ApplicationError::Configuration(format!("model '{}': {}", spec.name, e)))?;

    let api_key = credentials
        .api_key(provider)
        .ok_or_else(|| ApplicationError::MissingCredential {
            provider: provider.to_string(),
            variable: provider.credential_var().to_string(),
        })?;

    let backend = Backend::for_provider(provider);
    let params = GenerationParams::resolve(spec, &settings.generation);
    debug!(
        model = %spec.name,
        provider = %provider,
        max_tokens = params.max_tokens,
        timeout_secs = params.timeout.as_secs(),
        "Building model adapter"
    );

    let adapter = HttpAdapter::new(
        spec.clone(),
        backend,
        api_key,
        params,
        settings.prompts.clone(),
        settings.retry(),
    )?;
    Ok(Arc::new(adapter))
}
