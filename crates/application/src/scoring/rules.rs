//! Scoring rules - one per answer kind.

use exam_bench_domain::{Answer, AnswerKey, Correctness};
use tracing::trace;

/// Default absolute tolerance for free-response answers
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Decides whether a chosen answer matches the answer key.
///
/// `key` is `None` when the exam ships without an answer for the question.
pub trait ScoringRule: Send + Sync {
    /// Score one answer against its key
    fn score(&self, answer: Option<&Answer>, key: Option<&AnswerKey>) -> Correctness;

    /// Rule name used in logs
    fn name(&self) -> &'static str;
}

/// Multiple-choice: the chosen option must equal the key exactly.
///
/// Missing keys and keys outside 1-5 are not applicable, so a question can
/// never be marked wrong against an answer that could not have been chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactChoiceRule;

impl ScoringRule for ExactChoiceRule {
    fn score(&self, answer: Option<&Answer>, key: Option<&AnswerKey>) -> Correctness {
        let Some(expected) = key.and_then(AnswerKey::as_choice) else {
            return Correctness::NotApplicable;
        };

        let correct = match answer {
            Some(Answer::Choice(chosen)) => *chosen == expected,
            Some(Answer::Numeric(value)) => *value == f64::from(expected),
            None => false,
        };
        Correctness::from(Some(correct))
    }

    fn name(&self) -> &'static str {
        "exact_choice"
    }
}

/// Free-response: correct when `|chosen - key| < tolerance`.
///
/// A key that does not parse as a number is scored incorrect, not skipped.
#[derive(Debug, Clone, Copy)]
pub struct NumericToleranceRule {
    tolerance: f64,
}

impl NumericToleranceRule {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for NumericToleranceRule {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ScoringRule for NumericToleranceRule {
    fn score(&self, answer: Option<&Answer>, key: Option<&AnswerKey>) -> Correctness {
        let Some(key) = key else {
            return Correctness::NotApplicable;
        };

        let correct = match (answer.map(Answer::as_f64), key.as_number()) {
            (Some(chosen), Some(expected)) if chosen.is_finite() => {
                let diff = (chosen - expected).abs();
                trace!(chosen, expected, diff, tolerance = self.tolerance, "Numeric comparison");
                diff < self.tolerance
            }
            _ => false,
        };
        Correctness::from(Some(correct))
    }

    fn name(&self) -> &'static str {
        "numeric_tolerance"
    }
}
