//! Model registry listing

use super::CommandContext;
use crate::output::{colors, Formattable, TableFormatter};
use anyhow::Result;
use clap::Args;
use exam_bench_common::{CredentialSource, EnvCredentials, ModelRegistry};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Model registry file (overrides config)
    #[arg(long)]
    pub models_config: Option<PathBuf>,

    /// Only list enabled models
    #[arg(long)]
    pub enabled_only: bool,
}

/// One registry entry with its credential status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub model_id: String,
    pub enabled: bool,
    /// Environment variable that must hold the API key
    pub credential_var: Option<String>,
    pub credential_set: bool,
}

/// Credential status of every model in the registry
pub fn model_statuses(
    registry: &ModelRegistry,
    credentials: &dyn CredentialSource,
    enabled_only: bool,
) -> Vec<ModelStatus> {
    registry
        .models
        .iter()
        .filter(|spec| !enabled_only || spec.enabled)
        .map(|spec| {
            let provider = spec.provider_kind().ok();
            ModelStatus {
                name: spec.name.clone(),
                display_name: spec.label().to_string(),
                provider: spec.provider.clone(),
                model_id: spec.model_id.clone(),
                enabled: spec.enabled,
                credential_var: provider.map(|p| p.credential_var().to_string()),
                credential_set: provider.map_or(false, |p| credentials.api_key(p).is_some()),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ModelList(pub Vec<ModelStatus>);

impl Formattable for ModelList {
    fn format_table(&self) -> Result<String> {
        let rows = self
            .0
            .iter()
            .map(|status| {
                let credential = match (&status.credential_var, status.credential_set) {
                    (Some(_), true) => colors::success("set").to_string(),
                    (Some(var), false) => colors::error(&format!("missing ({})", var)).to_string(),
                    (None, _) => colors::warning("unknown provider").to_string(),
                };
                vec![
                    status.name.clone(),
                    status.provider.clone(),
                    status.model_id.clone(),
                    if status.enabled { "yes" } else { "no" }.to_string(),
                    credential,
                ]
            })
            .collect();

        TableFormatter::simple(
            vec!["Name", "Provider", "Model ID", "Enabled", "Credential"],
            rows,
        )
    }
}

/// List registry entries
pub fn list(ctx: &CommandContext, args: ModelsArgs) -> Result<()> {
    let registry = ctx.load_registry(args.models_config.as_deref())?;
    let credentials = EnvCredentials::with_dotenv();
    let statuses = ModelList(model_statuses(&registry, &credentials, args.enabled_only));

    if statuses.0.is_empty() {
        println!("{}", colors::warning("No models in registry"));
        return Ok(());
    }

    ctx.print(&statuses)
}
