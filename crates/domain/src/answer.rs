//! Answer values, answer keys and ternary correctness.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest valid multiple-choice option
pub const MIN_CHOICE: u8 = 1;

/// Highest valid multiple-choice option
pub const MAX_CHOICE: u8 = 5;

/// The shape of answer a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Pick one of the enumerated options (1-5)
    MultipleChoice,
    /// Short-answer question with a numeric answer
    FreeResponse,
}

impl AnswerKind {
    /// Whether this is a free-response (subjective) question
    pub fn is_subjective(self) -> bool {
        matches!(self, Self::FreeResponse)
    }
}

/// A validated answer chosen by a model.
///
/// The absence of an answer is modelled as `Option::<Answer>::None`, which
/// keeps "no valid answer" distinct from every real option, including zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// A multiple-choice option in `[MIN_CHOICE, MAX_CHOICE]`
    Choice(u8),
    /// A finite numeric free-response answer
    Numeric(f64),
}

impl Answer {
    /// Build a multiple-choice answer, rejecting options outside 1-5
    pub fn choice(option: i64) -> Option<Self> {
        u8::try_from(option)
            .ok()
            .filter(|o| (MIN_CHOICE..=MAX_CHOICE).contains(o))
            .map(Self::Choice)
    }

    /// Build a free-response answer, rejecting NaN and infinities
    pub fn numeric(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self::Numeric(value))
    }

    /// Numeric view of the answer
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Choice(option) => f64::from(*option),
            Self::Numeric(value) => *value,
        }
    }

    /// Whether the answer is acceptable for the given question kind
    pub fn is_valid_for(&self, kind: AnswerKind) -> bool {
        match (self, kind) {
            (Self::Choice(option), AnswerKind::MultipleChoice) => {
                (MIN_CHOICE..=MAX_CHOICE).contains(option)
            }
            (Self::Numeric(_), AnswerKind::MultipleChoice) => false,
            (answer, AnswerKind::FreeResponse) => answer.as_f64().is_finite(),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(option) => write!(f, "{}", option),
            Self::Numeric(value) => write!(f, "{}", value),
        }
    }
}

/// The answer key of a question as written in the exam document.
///
/// Exams may carry integers, decimals or numeric strings; interpretation
/// depends on the question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    /// Integer key (multiple-choice option or whole-number answer)
    Integer(i64),
    /// Decimal key
    Decimal(f64),
    /// Textual key, e.g. `"12"` or `"3.5"`
    Text(String),
}

impl AnswerKey {
    /// The key as a multiple-choice option, if it is an integer in 1-5
    pub fn as_choice(&self) -> Option<u8> {
        let answer = match self {
            Self::Integer(value) => Answer::choice(*value),
            Self::Decimal(value) if value.fract() == 0.0 => Answer::choice(*value as i64),
            Self::Decimal(_) => None,
            Self::Text(text) => text.trim().parse::<i64>().ok().and_then(Answer::choice),
        };
        match answer {
            Some(Answer::Choice(option)) => Some(option),
            _ => None,
        }
    }

    /// The key as a finite number
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Integer(value) => *value as f64,
            Self::Decimal(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Decimal(value) => write!(f, "{}", value),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Ternary correctness of a scored question.
///
/// Persisted as `true`, `false` or `null` under the `is_correct` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Correctness {
    /// The chosen answer matches the key
    Correct,
    /// The chosen answer does not match the key
    Incorrect,
    /// Not scored: skipped, failed, or the key is unknown
    NotApplicable,
}

impl Correctness {
    /// Whether the question counts towards the correct total
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    /// Short label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::NotApplicable => "n/a",
        }
    }
}

impl From<Option<bool>> for Correctness {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Correct,
            Some(false) => Self::Incorrect,
            None => Self::NotApplicable,
        }
    }
}

impl From<Correctness> for Option<bool> {
    fn from(value: Correctness) -> Self {
        match value {
            Correctness::Correct => Some(true),
            Correctness::Incorrect => Some(false),
            Correctness::NotApplicable => None,
        }
    }
}
