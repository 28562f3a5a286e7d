//! CLI commands

pub mod evaluate;
pub mod models;
pub mod summary;

use crate::output::{Formattable, OutputFormat};
use anyhow::{Context, Result};
use exam_bench_common::{AppConfig, ModelRegistry};
use std::path::{Path, PathBuf};

/// Context passed to all commands
pub struct CommandContext {
    pub config: AppConfig,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: AppConfig, format: OutputFormat, verbose: bool) -> Self {
        Self {
            config,
            format,
            verbose,
        }
    }

    /// Load the model registry from an explicit path or the configured default
    pub fn load_registry(&self, explicit: Option<&Path>) -> Result<ModelRegistry> {
        let path = explicit.unwrap_or(self.config.paths.models_config.as_path());
        ModelRegistry::load(path)
            .with_context(|| format!("Failed to load model registry from {}", path.display()))
    }

    /// Results directory from a flag or the configured default
    pub fn results_dir(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.config.paths.results_dir.clone())
    }

    /// Print a value in the selected output format
    pub fn print<T: Formattable>(&self, value: &T) -> Result<()> {
        println!("{}", value.format(self.format)?);
        Ok(())
    }
}
