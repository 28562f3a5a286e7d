//! Per-question results and run-level records.

use crate::answer::{Answer, AnswerKey, Correctness};
use crate::exam::{Exam, Question};
use crate::response::ModelResponse;
use crate::selection::QuestionSelection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Round to two decimal places, as used for every persisted percentage and time
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator` as a percentage rounded to two decimals; zero when empty
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        round2(numerator / denominator * 100.0)
    }
}

/// Terminal state of one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    /// The adapter produced a valid answer
    Answered,
    /// Never dispatched (blank text or excluded marker)
    Skipped,
    /// The adapter returned a failure
    Failed,
}

/// Persisted outcome of scoring one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Question identifier
    pub question_id: String,

    /// Question ordinal
    pub question_number: u32,

    /// Chosen answer; `null` when none
    pub answer: Option<Answer>,

    /// Answer key at evaluation time
    pub correct_answer: Option<AnswerKey>,

    /// Ternary correctness
    pub is_correct: Correctness,

    /// How the question terminated
    #[serde(default = "default_outcome")]
    pub outcome: QuestionOutcome,

    /// Model explanation
    #[serde(default)]
    pub reasoning: String,

    /// Seconds spent, rounded to two decimals
    #[serde(default)]
    pub time_taken: f64,

    /// Points available
    pub points: u32,

    /// Points earned; zero unless correct
    pub earned_points: u32,

    /// Whether the adapter produced a valid answer
    pub success: bool,

    /// Failure or skip reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_outcome() -> QuestionOutcome {
    QuestionOutcome::Answered
}

impl QuestionResult {
    /// Result for a question that was never dispatched
    pub fn skipped(question: &Question, reason: impl Into<String>) -> Self {
        Self {
            question_id: question.display_id(),
            question_number: question.question_number,
            answer: None,
            correct_answer: question.correct_answer.clone(),
            is_correct: Correctness::NotApplicable,
            outcome: QuestionOutcome::Skipped,
            reasoning: String::new(),
            time_taken: 0.0,
            points: question.points,
            earned_points: 0,
            success: false,
            error: Some(reason.into()),
        }
    }

    /// Result for a dispatched question, given the already-computed correctness.
    ///
    /// Failed responses are always not-applicable and earn nothing.
    pub fn scored(question: &Question, response: &ModelResponse, correctness: Correctness) -> Self {
        let (outcome, correctness) = if response.success {
            (QuestionOutcome::Answered, correctness)
        } else {
            (QuestionOutcome::Failed, Correctness::NotApplicable)
        };
        let earned_points = if correctness.is_correct() { question.points } else { 0 };

        Self {
            question_id: question.display_id(),
            question_number: question.question_number,
            answer: response.answer,
            correct_answer: question.correct_answer.clone(),
            is_correct: correctness,
            outcome,
            reasoning: response.reasoning.clone(),
            time_taken: round2(response.time_taken),
            points: question.points,
            earned_points,
            success: response.success,
            error: response.error.clone(),
        }
    }
}

/// Summary statistics of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Every result counts, including skipped and failed ones
    pub total_questions: usize,
    /// Results scored correct
    pub correct_answers: usize,
    /// `correct_answers / total_questions` in percent
    pub accuracy: f64,
    /// Sum of earned points
    pub total_score: u32,
    /// Sum of available points over all results
    pub max_score: u32,
    /// `total_score / max_score` in percent
    pub score_rate: f64,
    /// Mean seconds per question
    #[serde(default)]
    pub avg_time: f64,
}

impl RunSummary {
    /// Fold a finished result list into summary statistics
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a QuestionResult>,
    {
        let mut total_questions = 0usize;
        let mut correct_answers = 0usize;
        let mut total_score = 0u32;
        let mut max_score = 0u32;
        let mut total_time = 0.0f64;

        for result in results {
            total_questions += 1;
            if result.is_correct.is_correct() {
                correct_answers += 1;
            }
            total_score += result.earned_points;
            max_score += result.points;
            total_time += result.time_taken;
        }

        Self {
            total_questions,
            correct_answers,
            accuracy: percentage(correct_answers as f64, total_questions as f64),
            total_score,
            max_score,
            score_rate: percentage(f64::from(total_score), f64::from(max_score)),
            avg_time: if total_questions == 0 {
                0.0
            } else {
                round2(total_time / total_questions as f64)
            },
        }
    }
}

/// How questions were dispatched during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchMode {
    /// One question at a time in ordinal order
    #[default]
    Sequential,
    /// Bounded worker pool
    Concurrent {
        /// Concurrency limit
        max_workers: usize,
    },
}

/// One model's complete pass over one exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    /// Unique run identifier
    #[serde(default = "Uuid::new_v4")]
    pub run_id: Uuid,
    /// Exam identifier
    pub exam_id: String,
    /// Exam title
    #[serde(default)]
    pub exam_title: String,
    /// Exam subject
    pub subject: String,
    /// Model name
    pub model_name: String,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Dispatch mode used
    #[serde(default)]
    pub dispatch: DispatchMode,
    /// Question subset, if the run was filtered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_filter: Option<QuestionSelection>,
    /// Summary statistics folded from `results`
    pub summary: RunSummary,
    /// Results ordered by question number
    pub results: Vec<QuestionResult>,
}

impl EvaluationRun {
    /// Build a run from collected results.
    ///
    /// Results are sorted by ordinal before the summary is folded.
    pub fn new(
        exam: &Exam,
        model_name: impl Into<String>,
        dispatch: DispatchMode,
        question_filter: Option<QuestionSelection>,
        mut results: Vec<QuestionResult>,
    ) -> Self {
        results.sort_by_key(|r| r.question_number);
        let summary = RunSummary::from_results(&results);

        Self {
            run_id: Uuid::new_v4(),
            exam_id: exam.exam_id.clone(),
            exam_title: exam.title.clone(),
            subject: exam.subject.clone(),
            model_name: model_name.into(),
            timestamp: Utc::now(),
            dispatch,
            question_filter,
            summary,
            results,
        }
    }

    /// Summary recomputed over the results matching a predicate
    pub fn summary_where<P>(&self, predicate: P) -> RunSummary
    where
        P: Fn(&QuestionResult) -> bool,
    {
        RunSummary::from_results(self.results.iter().filter(|r| predicate(r)))
    }

    /// Results that failed or were skipped, for auditing
    pub fn unanswered(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results
            .iter()
            .filter(|r| r.outcome != QuestionOutcome::Answered)
    }
}
