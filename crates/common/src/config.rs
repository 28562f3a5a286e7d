//! Configuration management for the application.
//!
//! Settings are layered with the `config` crate. Every field has a built-in
//! default, so an empty environment yields a working configuration.
//!
//! ## Example Configuration
//!
//! ```toml
//! [evaluation]
//! free_response_tolerance = 0.01
//! max_workers = 10
//!
//! [generation]
//! temperature = 0.1
//! max_tokens = 2000
//! timeout_secs = 60
//!
//! [paths]
//! results_dir = "results"
//!
//! [leaderboard]
//! listening_subject = "english"
//! listening_cutoff = 15
//! ```

use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variable overrides, e.g. `EXAM_BENCH__EVALUATION__MAX_WORKERS=4`
pub const ENV_PREFIX: &str = "EXAM_BENCH";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scoring and dispatch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Absolute tolerance for free-response answers
    #[serde(default = "default_tolerance")]
    pub free_response_tolerance: f64,

    /// Phrases marking a "find the incorrect statement" question
    #[serde(default = "default_negation_markers")]
    pub negation_markers: Vec<String>,

    /// Phrases marking listening items that are skipped
    #[serde(default = "default_skip_markers")]
    pub skip_markers: Vec<String>,

    /// Worker pool size for concurrent dispatch
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

/// Default generation parameters applied when a model entry sets none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP failures (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_exams_dir")]
    pub exams_dir: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_models_config")]
    pub models_config: PathBuf,

    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

/// Leaderboard aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Subjects that get their own board
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,

    /// Subject whose low-numbered questions are listening items
    #[serde(default = "default_listening_subject")]
    pub listening_subject: String,

    /// Questions numbered up to and including this are excluded for the listening subject
    #[serde(default = "default_listening_cutoff")]
    pub listening_cutoff: u32,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_tolerance() -> f64 {
    0.01
}

fn default_negation_markers() -> Vec<String> {
    [
        "않는", "아닌", "틀린", "잘못", "부적절", "올바르지", "맞지", "적절하지", "일치하지",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_skip_markers() -> Vec<String> {
    ["[듣기]", "듣기 문제", "다음을 듣고", "대화를 듣고"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_workers() -> usize {
    10
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_exams_dir() -> PathBuf {
    PathBuf::from("exams/parsed")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_models_config() -> PathBuf {
    PathBuf::from("models/models.json")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_subjects() -> Vec<String> {
    vec!["korean".to_string(), "math".to_string(), "english".to_string()]
}

fn default_listening_subject() -> String {
    "english".to_string()
}

fn default_listening_cutoff() -> u32 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            free_response_tolerance: default_tolerance(),
            negation_markers: default_negation_markers(),
            skip_markers: default_skip_markers(),
            max_workers: default_max_workers(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            exams_dir: default_exams_dir(),
            results_dir: default_results_dir(),
            models_config: default_models_config(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            listening_subject: default_listening_subject(),
            listening_cutoff: default_listening_cutoff(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from configuration files and environment variables.
    ///
    /// The configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. config/default.{toml,yaml,json} (if exists)
    /// 3. config/{environment} (if exists, where environment is from EXAM_BENCH_ENV)
    /// 4. The explicit file, if given
    /// 5. Environment variables (prefixed with EXAM_BENCH__)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use exam_bench_common::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load configuration");
    /// println!("Results go to {}", config.paths.results_dir.display());
    /// ```
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var("EXAM_BENCH_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Example: EXAM_BENCH__EVALUATION__MAX_WORKERS=4
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("evaluation.negation_markers")
                    .with_list_parse_key("evaluation.skip_markers")
                    .with_list_parse_key("leaderboard.subjects"),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.evaluation.free_response_tolerance > 0.0) {
            anyhow::bail!("Free-response tolerance must be greater than 0");
        }

        if self.evaluation.max_workers == 0 {
            anyhow::bail!("Number of workers must be greater than 0");
        }

        if self.generation.max_tokens == 0 {
            anyhow::bail!("Max tokens must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!(
                "Temperature must be between 0 and 2, got {}",
                self.generation.temperature
            );
        }

        if self.generation.timeout_secs == 0 {
            anyhow::bail!("Timeout must be greater than 0");
        }

        if self.paths.results_dir.as_os_str().is_empty() {
            anyhow::bail!("Results directory is required");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }
}

impl GenerationConfig {
    /// Per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for transient adapter failures
    pub fn retry_config(&self) -> RetryConfig {
        if self.max_retries == 0 {
            RetryConfig::no_retry()
        } else {
            RetryConfig::new(
                self.max_retries,
                Duration::from_millis(self.retry_initial_delay_ms),
            )
        }
    }
}
