//! Exam Bench Domain Types
//!
//! This crate provides the core domain model for benchmarking language models
//! against standardized exams. It defines exams and their answer keys, the
//! normalized model response, per-question results and run-level records.
//!
//! ## Architecture
//!
//! - **exam**: Exams, passages and questions as read from exam documents
//! - **answer**: Answer values, answer keys and ternary correctness
//! - **response**: The normalized output of one model invocation
//! - **result**: Question results, run summaries and evaluation runs
//! - **selection**: Question subset parsing (`1-5,8,10-12`)
//! - **model**: Model registry entries and providers
//! - **validation**: Exam integrity checks
//! - **errors**: Domain error types
//!
//! ## Usage
//!
//! ```rust
//! use exam_bench_domain::{Answer, AnswerKey, QuestionSelection};
//!
//! let selection = QuestionSelection::parse("1-3,5").unwrap();
//! assert!(selection.contains(5));
//!
//! assert_eq!(Answer::choice(3), Some(Answer::Choice(3)));
//! assert_eq!(AnswerKey::Integer(3).as_choice(), Some(3));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod errors;
pub mod exam;
pub mod model;
pub mod response;
pub mod result;
pub mod selection;
pub mod validation;

pub use answer::{Answer, AnswerKey, AnswerKind, Correctness, MAX_CHOICE, MIN_CHOICE};
pub use errors::{DomainError, DomainResult, SelectionError};
pub use exam::{Exam, Passage, Question, DEFAULT_POINTS};
pub use model::{ModelSpec, Provider};
pub use response::ModelResponse;
pub use result::{
    percentage, round2, DispatchMode, EvaluationRun, QuestionOutcome, QuestionResult, RunSummary,
};
pub use selection::QuestionSelection;
pub use validation::{ensure_exam_integrity, validate_exam, IssueSeverity, ValidationIssue, ValidationResult};
