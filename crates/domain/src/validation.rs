//! Exam integrity validation.
//!
//! Integrity errors (dangling passage references, duplicate ordinals) make an
//! exam unusable and are reported at load time. Warnings flag data that is
//! still evaluable but will not be scored, such as an out-of-range key on a
//! multiple-choice question.

use crate::answer::AnswerKind;
use crate::errors::{DomainError, DomainResult};
use crate::exam::Exam;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of validating an exam
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Problems that make the exam unusable
    pub errors: Vec<ValidationIssue>,

    /// Problems that do not block evaluation
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether the exam has no blocking errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn add_warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        });
    }
}

/// Individual validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location of the problem, e.g. `questions[3].passage_id`
    pub path: String,

    /// Human-readable description
    pub message: String,

    /// Severity level
    pub severity: IssueSeverity,
}

/// Severity level of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Blocks evaluation
    Error,

    /// Evaluable, but worth a look
    Warning,
}

/// Collect every integrity error and warning of an exam
pub fn validate_exam(exam: &Exam) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (path, error) in integrity_errors(exam) {
        result.errors.push(ValidationIssue {
            path,
            message: error.to_string(),
            severity: IssueSeverity::Error,
        });
    }

    for (index, question) in exam.questions.iter().enumerate() {
        let path = format!("questions[{}]", index);

        if question.kind() == AnswerKind::MultipleChoice {
            if question.choices.len() > 5 {
                result.add_warning(
                    format!("{}.choices", path),
                    format!("{} choices; only options 1-5 can be answered", question.choices.len()),
                );
            }
            if let Some(key) = &question.correct_answer {
                if key.as_choice().is_none() {
                    result.add_warning(
                        format!("{}.correct_answer", path),
                        format!("answer key '{}' is outside 1-5 and will not be scored", key),
                    );
                }
            }
        }

        if question.points == 0 {
            result.add_warning(format!("{}.points", path), "question is worth zero points");
        }
    }

    result
}

/// Fail with the first integrity error, otherwise return the warnings
pub fn ensure_exam_integrity(exam: &Exam) -> DomainResult<ValidationResult> {
    if let Some((_, error)) = integrity_errors(exam).into_iter().next() {
        return Err(error);
    }
    Ok(validate_exam(exam))
}

fn integrity_errors(exam: &Exam) -> Vec<(String, DomainError)> {
    let mut errors = Vec::new();
    let invalid = |reason: String| DomainError::InvalidExam {
        exam_id: exam.exam_id.clone(),
        reason,
    };

    if exam.exam_id.trim().is_empty() {
        errors.push(("exam_id".to_string(), invalid("exam_id is empty".to_string())));
    }
    if exam.questions.is_empty() {
        errors.push(("questions".to_string(), invalid("exam has no questions".to_string())));
    }

    let mut passage_ids = HashSet::new();
    for (index, passage) in exam.passages.iter().enumerate() {
        if !passage_ids.insert(passage.passage_id.as_str()) {
            errors.push((
                format!("passages[{}].passage_id", index),
                invalid(format!("duplicate passage id '{}'", passage.passage_id)),
            ));
        }
    }

    let mut numbers = HashSet::new();
    for (index, question) in exam.questions.iter().enumerate() {
        if question.question_number == 0 {
            errors.push((
                format!("questions[{}].question_number", index),
                invalid("question numbers start at 1".to_string()),
            ));
        } else if !numbers.insert(question.question_number) {
            errors.push((
                format!("questions[{}].question_number", index),
                DomainError::DuplicateQuestionNumber(question.question_number),
            ));
        }

        if let Some(passage_id) = &question.passage_id {
            if !passage_ids.contains(passage_id.as_str()) {
                errors.push((
                    format!("questions[{}].passage_id", index),
                    DomainError::UnknownPassage {
                        question_number: question.question_number,
                        passage_id: passage_id.clone(),
                    },
                ));
            }
        }
    }

    errors
}
