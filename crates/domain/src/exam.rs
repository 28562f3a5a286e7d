//! Exam definitions: exams, passages and questions.
//!
//! Exams are produced by an offline parsing step and are immutable during
//! evaluation. Both YAML and JSON documents deserialize into these types.

use crate::answer::{AnswerKey, AnswerKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point value of a question when the exam does not specify one
pub const DEFAULT_POINTS: u32 = 2;

fn default_points() -> u32 {
    DEFAULT_POINTS
}

/// A complete exam with its answer key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier, e.g. `2025-korean-csat`
    pub exam_id: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Subject tag used by subject leaderboards (e.g. `korean`, `math`)
    pub subject: String,

    /// Exam year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,

    /// Shared reading passages referenced by id
    #[serde(default)]
    pub passages: Vec<Passage>,

    /// Questions in document order
    pub questions: Vec<Question>,
}

/// A block of text shared by one or more questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Identifier, unique within the exam
    #[serde(alias = "id")]
    pub passage_id: String,

    /// Full passage text
    #[serde(alias = "text")]
    pub passage_text: String,
}

/// One exam question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier
    #[serde(default)]
    pub question_id: String,

    /// 1-based ordinal used for display, filtering and range selection
    pub question_number: u32,

    /// Question stem
    #[serde(default)]
    pub question_text: String,

    /// Option texts; empty for free-response questions
    #[serde(default)]
    pub choices: Vec<String>,

    /// Reference to a passage in the same exam
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<String>,

    /// Passage text embedded directly in the question (legacy shape)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,

    /// Answer key; `None` for items that are never scored
    #[serde(default)]
    pub correct_answer: Option<AnswerKey>,

    /// Points awarded for a correct answer
    #[serde(default = "default_points")]
    pub points: u32,

    /// Elective subject tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
}

impl Question {
    /// Multiple-choice when choices are present, free-response otherwise
    pub fn kind(&self) -> AnswerKind {
        if self.choices.is_empty() {
            AnswerKind::FreeResponse
        } else {
            AnswerKind::MultipleChoice
        }
    }

    /// Whether the question has no usable text
    pub fn is_blank(&self) -> bool {
        self.question_text.trim().is_empty()
    }

    /// Whether the question text contains any of the given markers
    pub fn contains_marker<S: AsRef<str>>(&self, markers: &[S]) -> bool {
        markers
            .iter()
            .map(AsRef::as_ref)
            .filter(|m| !m.is_empty())
            .any(|m| self.question_text.contains(m))
    }

    /// Identifier for reports, falling back to the ordinal
    pub fn display_id(&self) -> String {
        if self.question_id.is_empty() {
            format!("q{}", self.question_number)
        } else {
            self.question_id.clone()
        }
    }
}

impl Exam {
    /// Passage id to text lookup table
    pub fn passage_table(&self) -> HashMap<String, String> {
        self.passages
            .iter()
            .map(|p| (p.passage_id.clone(), p.passage_text.clone()))
            .collect()
    }

    /// Sum of points over all questions
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}
