//! Model registry entries and provider identifiers.

use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Model API providers with a built-in adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini `generateContent`
    Google,
    /// Upstage Solar (OpenAI-compatible)
    Upstage,
    /// Perplexity (OpenAI-compatible)
    Perplexity,
}

impl Provider {
    /// Every supported provider
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::Upstage,
        Provider::Perplexity,
    ];

    /// Registry name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Upstage => "upstage",
            Self::Perplexity => "perplexity",
        }
    }

    /// Environment variable holding the API key
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Upstage => "UPSTAGE_API_KEY",
            Self::Perplexity => "PERPLEXITY_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownProvider(s.to_string()))
    }
}

fn default_enabled() -> bool {
    true
}

/// One entry of the model registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Registry name, also used as the result file name
    pub name: String,

    /// Provider name; resolved when the adapter is built
    pub provider: String,

    /// Identifier sent to the provider API
    pub model_id: String,

    /// Name shown in reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Whether the model appears in aggregated views
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Output token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Per-call timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Nucleus sampling probability mass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Top-k sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Override for the provider endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

impl ModelSpec {
    /// Minimal spec with provider defaults for every generation parameter
    pub fn new(name: impl Into<String>, provider: Provider, model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.as_str().to_string(),
            model_id: model_id.into(),
            display_name: None,
            enabled: true,
            max_tokens: None,
            temperature: None,
            timeout: None,
            top_p: None,
            top_k: None,
            base_url: None,
        }
    }

    /// Resolve the provider name
    pub fn provider_kind(&self) -> Result<Provider, DomainError> {
        self.provider.parse()
    }

    /// Display name, falling back to the registry name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether an identifier refers to this model by name or API id
    pub fn is_identified_by(&self, identifier: &str) -> bool {
        self.name == identifier || self.model_id == identifier
    }
}
