//! Testing utilities for exam-bench
//!
//! This crate provides:
//! - Exam fixtures shaped like real test papers
//! - Builder patterns for exams, questions and stored runs
//! - Mock model adapters (fixed, scripted, failing, panicking)
//! - A recording observer for progress assertions
//!
//! # Examples
//!
//! ```
//! use exam_bench_testing::{builders::*, fixtures::*};
//!
//! let exam = ExamBuilder::new("mock-2025")
//!     .with_subject("math")
//!     .with_question(QuestionBuilder::multiple_choice(1, 3).build())
//!     .build();
//! assert_eq!(exam.questions.len(), 1);
//!
//! let scenario = three_question_exam();
//! assert_eq!(scenario.max_score(), 6);
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use proptest;
pub use tempfile;
pub use wiremock;
