//! Model registry loading and credential lookup.
//!
//! The registry is a JSON document listing every model that can be
//! evaluated. API keys are never stored in it; they come from the
//! environment (optionally seeded from a `.env` file).

use exam_bench_domain::{ModelSpec, Provider};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Registry loading errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Model registry not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read model registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate model name '{0}' in registry")]
    DuplicateName(String),
}

/// The set of models available for evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistry {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Load `{"models": [...]}` from a JSON file
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Err(RegistryError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry: Self = serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut seen = HashSet::new();
        for model in &registry.models {
            if !seen.insert(model.name.as_str()) {
                return Err(RegistryError::DuplicateName(model.name.clone()));
            }
        }

        tracing::debug!(path = %path.display(), models = registry.models.len(), "Loaded model registry");
        Ok(registry)
    }

    /// Registry from an explicit list
    pub fn from_models(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    /// Find a model by registry name or API identifier
    pub fn find(&self, identifier: &str) -> Option<&ModelSpec> {
        self.models
            .iter()
            .find(|m| m.name == identifier)
            .or_else(|| self.models.iter().find(|m| m.model_id == identifier))
    }

    /// Models whose provider name resolves to `provider`
    pub fn by_provider(&self, provider: Provider) -> Vec<&ModelSpec> {
        self.models
            .iter()
            .filter(|m| m.provider_kind().ok() == Some(provider))
            .collect()
    }

    /// Names and API identifiers of every enabled model.
    ///
    /// Runs are keyed by model name, but older result files may carry the
    /// API identifier instead, so both are included.
    pub fn enabled_identifiers(&self) -> HashSet<String> {
        self.models
            .iter()
            .filter(|m| m.enabled)
            .flat_map(|m| [m.name.clone(), m.model_id.clone()])
            .collect()
    }
}

/// Source of provider API keys
pub trait CredentialSource: Send + Sync {
    /// API key for a provider, if configured
    fn api_key(&self, provider: Provider) -> Option<String>;
}

/// Reads `{PROVIDER}_API_KEY` from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Load a `.env` file from the working directory or its parents, if any
    pub fn with_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Self
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: Provider) -> Option<String> {
        std::env::var(provider.credential_var())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Fixed in-memory credentials
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<Provider, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, provider: Provider, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self, provider: Provider) -> Option<String> {
        self.keys.get(&provider).cloned()
    }
}
