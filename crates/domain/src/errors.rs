//! Error types for the exam benchmark domain.
//!
//! Domain errors describe problems with exam data itself: integrity
//! violations found while loading an exam and malformed question
//! selections. Adapter and I/O failures live in the application layer.

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Top-level domain error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The exam document is structurally invalid
    #[error("Invalid exam '{exam_id}': {reason}")]
    InvalidExam {
        /// Exam the problem was found in
        exam_id: String,
        /// Human-readable description
        reason: String,
    },

    /// A question references a passage that does not exist in the exam
    #[error("Question {question_number} references unknown passage '{passage_id}'")]
    UnknownPassage {
        /// Ordinal number of the offending question
        question_number: u32,
        /// The dangling passage identifier
        passage_id: String,
    },

    /// Two questions share the same ordinal number
    #[error("Duplicate question number {0}")]
    DuplicateQuestionNumber(u32),

    /// A provider name with no built-in adapter
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// A question-range expression could not be parsed
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl DomainError {
    /// Get the error code for this error
    ///
    /// Error codes are stable identifiers for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidExam { .. } => "INVALID_EXAM",
            Self::UnknownPassage { .. } => "UNKNOWN_PASSAGE",
            Self::DuplicateQuestionNumber(_) => "DUPLICATE_QUESTION_NUMBER",
            Self::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            Self::Selection(_) => "INVALID_SELECTION",
        }
    }
}

/// Errors produced while parsing a question selection such as `1-5,8,10-12`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The expression was empty
    #[error("Question selection is empty")]
    Empty,

    /// A comma-separated part was empty, e.g. `1,,3`
    #[error("Empty element in question selection '{0}'")]
    EmptyElement(String),

    /// A part was not a number or range
    #[error("Invalid question number '{0}'")]
    InvalidNumber(String),

    /// Question numbers are 1-based
    #[error("Question numbers start at 1, got 0")]
    Zero,

    /// A range whose start is greater than its end
    #[error("Invalid range {start}-{end}: start is greater than end")]
    ReversedRange {
        /// Range start
        start: u32,
        /// Range end
        end: u32,
    },
}
