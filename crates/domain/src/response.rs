//! Normalized output of one model invocation.

use crate::answer::{Answer, AnswerKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a model adapter returns for one question.
///
/// Adapters never fail past their own boundary: transport errors, timeouts
/// and unparseable output all come back as a response with `success = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Selected answer; `None` when no valid answer was produced
    pub answer: Option<Answer>,

    /// Model explanation
    pub reasoning: String,

    /// Wall-clock seconds from call start to completion or failure
    pub time_taken: f64,

    /// Unprocessed model output
    pub raw_response: String,

    /// Name of the model that produced the response
    pub model_name: String,

    /// Whether a valid answer was produced
    pub success: bool,

    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    /// A response carrying a valid answer
    pub fn answered(
        model_name: impl Into<String>,
        answer: Answer,
        reasoning: impl Into<String>,
        raw_response: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            answer: Some(answer),
            reasoning: reasoning.into(),
            time_taken: elapsed.as_secs_f64(),
            raw_response: raw_response.into(),
            model_name: model_name.into(),
            success: true,
            error: None,
        }
    }

    /// A failed response
    pub fn failed(
        model_name: impl Into<String>,
        error: impl Into<String>,
        raw_response: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            answer: None,
            reasoning: String::new(),
            time_taken: elapsed.as_secs_f64(),
            raw_response: raw_response.into(),
            model_name: model_name.into(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// Attach reasoning text, e.g. the raw output of a failed extraction
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Whether the response is successful and its answer fits the question kind
    pub fn is_valid_for(&self, kind: AnswerKind) -> bool {
        self.success && self.answer.map_or(false, |a| a.is_valid_for(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answered_response() {
        let response = ModelResponse::answered(
            "stub",
            Answer::Choice(3),
            "because",
            "{}",
            Duration::from_millis(1500),
        );

        assert!(response.success);
        assert_eq!(response.time_taken, 1.5);
        assert!(response.is_valid_for(AnswerKind::MultipleChoice));
        assert!(response.is_valid_for(AnswerKind::FreeResponse));
    }

    #[test]
    fn test_failed_response_has_no_answer() {
        let response = ModelResponse::failed("stub", "timeout", "", Duration::from_secs(60));

        assert!(!response.success);
        assert!(response.answer.is_none());
        assert_eq!(response.error.as_deref(), Some("timeout"));
        assert!(!response.is_valid_for(AnswerKind::MultipleChoice));
    }

    #[test]
    fn test_numeric_answer_is_invalid_for_multiple_choice() {
        let response = ModelResponse::answered(
            "stub",
            Answer::Numeric(2.5),
            "",
            "",
            Duration::ZERO,
        );
        assert!(!response.is_valid_for(AnswerKind::MultipleChoice));
    }
}
