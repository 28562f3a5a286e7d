//! Application layer for exam-bench
//!
//! This crate runs models over exams and aggregates the results.
//!
//! ## Modules
//!
//! - `adapters` - Provider adapters implementing "solve one question"
//! - `extraction` - Layered recovery of answers from raw model output
//! - `prompt` - Prompt construction and question framing
//! - `scoring` - Per-question correctness rules
//! - `evaluator` - Sequential and concurrent run orchestration
//! - `loader` - Exam discovery and integrity-checked loading
//! - `store` - Run persistence keyed by exam and model
//! - `summary` - Leaderboards and statistics over stored runs

pub mod adapters;
pub mod evaluator;
pub mod extraction;
pub mod loader;
pub mod prompt;
pub mod scoring;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use adapters::{build_adapter, AdapterError, AdapterSettings, GenerationParams, ModelAdapter};
pub use evaluator::{
    EvaluationObserver, EvaluatorConfig, ExamEvaluator, ExamEvaluatorBuilder, NoOpObserver,
    RunOptions, SkipReason,
};
pub use extraction::{extract_answer, extract_answer_heuristic, extract_json_block, Extraction};
pub use loader::{discover_exams, load_exam};
pub use prompt::{PromptBuilder, SolveRequest};
pub use scoring::{ScoringEngine, ScoringEngineBuilder, ScoringEngineConfig, ScoringRule};
pub use store::ResultStore;
pub use summary::{
    Aggregator, Leaderboard, LeaderboardExport, LeaderboardRow, Statistics, SummaryOptions,
};

use exam_bench_domain::DomainError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug, Clone)]
pub enum ApplicationError {
    /// File or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Exam data failed integrity checks
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Bad or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider API key is not set
    #[error("Missing credential for {provider}: set {variable}")]
    MissingCredential { provider: String, variable: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Document could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Provider call failed outside a question run
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApplicationError::Adapter(_) | ApplicationError::Io(_))
    }

    /// Whether evaluation of other models can continue after this error
    pub fn skips_model_only(&self) -> bool {
        matches!(
            self,
            ApplicationError::MissingCredential { .. } | ApplicationError::Configuration(_)
        )
    }

    /// Get error code
    pub fn error_code(&self) -> &'static str {
        match self {
            ApplicationError::NotFound(_) => "NOT_FOUND",
            ApplicationError::InvalidInput(_) => "INVALID_INPUT",
            ApplicationError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApplicationError::Configuration(_) => "CONFIGURATION_ERROR",
            ApplicationError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            ApplicationError::Io(_) => "IO_ERROR",
            ApplicationError::Serialization(_) => "SERIALIZATION_ERROR",
            ApplicationError::Adapter(_) => "ADAPTER_ERROR",
            ApplicationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ApplicationError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Selection(_) => ApplicationError::InvalidInput(error.to_string()),
            DomainError::UnknownProvider(_) => ApplicationError::Configuration(error.to_string()),
            _ => ApplicationError::ValidationFailed(error.to_string()),
        }
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(error: std::io::Error) -> Self {
        ApplicationError::Io(error.to_string())
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
