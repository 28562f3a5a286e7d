//! Common utilities shared by the exam-bench crates.
//!
//! This crate provides foundational utilities including:
//! - Configuration management
//! - Model registry and credential lookup
//! - Tracing setup with an optional verbose log file
//! - Document (YAML/JSON) serialization helpers
//! - Retry logic with backoff

pub mod config;
pub mod models;
pub mod retry;
pub mod serialization;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    AppConfig, EvaluationConfig, GenerationConfig, LeaderboardConfig, LoggingConfig, PathsConfig,
};
pub use models::{CredentialSource, EnvCredentials, ModelRegistry, RegistryError, StaticCredentials};
pub use retry::{retry_transient, RetryConfig, Transient};
pub use serialization::{read_document, write_document, DocumentFormat};
pub use telemetry::{init_tracing, timestamped_log_path, TelemetryGuard, TracingOptions};

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
