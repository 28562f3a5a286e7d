//! Run-scoped state shared by every question task of one (exam, model) run.
//!
//! Everything here is read-only once the run starts. Results are collected
//! and folded only after all tasks finish.

use super::observer::EvaluationObserver;
use crate::adapters::ModelAdapter;
use crate::prompt::SolveRequest;
use crate::scoring::ScoringEngine;
use exam_bench_domain::{Exam, ModelResponse, Question, QuestionResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Why a question was never sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    BlankText,
    ExcludedMarker(String),
}

impl SkipReason {
    pub fn message(&self) -> String {
        match self {
            Self::BlankText => "Question text is empty".to_string(),
            Self::ExcludedMarker(marker) => format!("Skipped: excluded category ({})", marker),
        }
    }
}

pub(crate) struct RunContext {
    pub exam: Arc<Exam>,
    pub passages: HashMap<String, String>,
    pub adapter: Arc<dyn ModelAdapter>,
    pub scoring: Arc<ScoringEngine>,
    pub skip_markers: Arc<[String]>,
    pub observer: Arc<dyn EvaluationObserver>,
    pub log_raw_output: bool,
}

impl RunContext {
    pub fn new(
        exam: Arc<Exam>,
        adapter: Arc<dyn ModelAdapter>,
        scoring: Arc<ScoringEngine>,
        skip_markers: Arc<[String]>,
        observer: Arc<dyn EvaluationObserver>,
        log_raw_output: bool,
    ) -> Self {
        let passages = exam.passage_table();
        Self {
            exam,
            passages,
            adapter,
            scoring,
            skip_markers,
            observer,
            log_raw_output,
        }
    }

    pub fn model_name(&self) -> &str {
        self.adapter.model_name()
    }

    /// Embedded passage text first, then the run's passage table
    pub fn passage_for<'a>(&'a self, question: &'a Question) -> Option<&'a str> {
        question
            .passage
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| {
                let id = question.passage_id.as_deref()?;
                self.passages.get(id).map(String::as_str)
            })
    }

    pub fn skip_reason(&self, question: &Question) -> Option<SkipReason> {
        if question.is_blank() {
            return Some(SkipReason::BlankText);
        }
        self.skip_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .find(|marker| question.question_text.contains(marker.as_str()))
            .map(|marker| SkipReason::ExcludedMarker(marker.clone()))
    }

    /// Evaluate the question at `index` in the exam's question list
    #[instrument(
        skip(self),
        fields(
            exam_id = %self.exam.exam_id,
            model = %self.model_name(),
            question_number = self.exam.questions[index].question_number
        )
    )]
    pub async fn evaluate(&self, index: usize) -> QuestionResult {
        let question = &self.exam.questions[index];

        if let Some(reason) = self.skip_reason(question) {
            debug!(reason = ?reason, "Question skipped");
            return QuestionResult::skipped(question, reason.message());
        }

        let request = SolveRequest::new(
            &question.question_text,
            &question.choices,
            self.passage_for(question),
        );
        let response = self.adapter.solve(&request).await;
        self.log_response(&response);

        let result = self.scoring.score(question, &response);
        debug!(
            answer = ?result.answer,
            correct_answer = ?result.correct_answer,
            correctness = result.is_correct.label(),
            time_taken = result.time_taken,
            error = ?result.error,
            "Question evaluated"
        );
        result
    }

    /// Failed result for a task that never produced one (e.g. it panicked)
    pub fn failed(&self, index: usize, error: impl Into<String>) -> QuestionResult {
        let question = &self.exam.questions[index];
        let response = ModelResponse::failed(self.model_name(), error, "", Duration::ZERO);
        self.scoring.score(question, &response)
    }

    fn log_response(&self, response: &ModelResponse) {
        if self.log_raw_output {
            debug!(raw_response = %response.raw_response, reasoning = %response.reasoning, "Model output");
        }
    }
}
