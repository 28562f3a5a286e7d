//! Mock model adapters and observers.
//!
//! Provides in-process adapters for testing the evaluator without network access.

use async_trait::async_trait;
use exam_bench_application::{extract_answer, EvaluationObserver, ModelAdapter, SolveRequest};
use exam_bench_domain::{Answer, EvaluationRun, Exam, ModelResponse, QuestionResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Adapter that answers every question with the same answer
pub struct StubAdapter {
    name: String,
    answer: Answer,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl StubAdapter {
    pub fn new(name: impl Into<String>, answer: Answer) -> Self {
        Self {
            name: name.into(),
            answer,
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Sleep before answering, to force interleaving under concurrent dispatch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Question texts received, in call order
    pub fn received(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }
}

#[async_trait]
impl ModelAdapter for StubAdapter {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse {
        self.calls.write().push(request.question_text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        ModelResponse::answered(
            &self.name,
            self.answer,
            "stub reasoning",
            format!("{{\"answer\": {}}}", self.answer),
            self.delay.unwrap_or_default(),
        )
    }
}

/// Adapter that answers according to a question-text lookup table.
///
/// Questions missing from the script come back as failures.
pub struct ScriptedAdapter {
    name: String,
    script: HashMap<String, Answer>,
    passages: Arc<RwLock<Vec<Option<String>>>>,
}

impl ScriptedAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: HashMap::new(),
            passages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn answer(mut self, question_text: impl Into<String>, answer: Answer) -> Self {
        self.script.insert(question_text.into(), answer);
        self
    }

    /// Passages attached to each request, in call order
    pub fn passages_seen(&self) -> Vec<Option<String>> {
        self.passages.read().clone()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse {
        self.passages
            .write()
            .push(request.passage.map(str::to_string));

        match self.script.get(request.question_text) {
            Some(answer) => ModelResponse::answered(
                &self.name,
                *answer,
                "scripted",
                answer.to_string(),
                Duration::ZERO,
            ),
            None => ModelResponse::failed(
                &self.name,
                format!("No scripted answer for: {}", request.question_text),
                "",
                Duration::ZERO,
            ),
        }
    }
}

/// Adapter that returns canned raw text and runs the real extraction pipeline on it
pub struct RawOutputAdapter {
    name: String,
    output: String,
}

impl RawOutputAdapter {
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

#[async_trait]
impl ModelAdapter for RawOutputAdapter {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse {
        match extract_answer(&self.output, request.kind) {
            Some(extraction) => ModelResponse::answered(
                &self.name,
                extraction.answer,
                extraction.reasoning.unwrap_or_default(),
                self.output.as_str(),
                Duration::ZERO,
            ),
            None => ModelResponse::failed(
                &self.name,
                "No valid answer found in model output",
                self.output.as_str(),
                Duration::ZERO,
            ),
        }
    }
}

/// Adapter whose every call fails, like a provider that is down
pub struct FailingAdapter {
    name: String,
    error: String,
}

impl FailingAdapter {
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl ModelAdapter for FailingAdapter {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, _request: &SolveRequest<'_>) -> ModelResponse {
        ModelResponse::failed(&self.name, self.error.as_str(), "", Duration::ZERO)
    }
}

/// Adapter that panics when the question text contains a trigger, and answers otherwise
pub struct PanickingAdapter {
    name: String,
    trigger: String,
    answer: Answer,
}

impl PanickingAdapter {
    pub fn new(name: impl Into<String>, trigger: impl Into<String>, answer: Answer) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            answer,
        }
    }
}

#[async_trait]
impl ModelAdapter for PanickingAdapter {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, request: &SolveRequest<'_>) -> ModelResponse {
        if request.question_text.contains(&self.trigger) {
            panic!("adapter crashed on {}", request.question_text);
        }
        ModelResponse::answered(&self.name, self.answer, "", "", Duration::ZERO)
    }
}

/// Observer that records every progress event
#[derive(Default)]
pub struct RecordingObserver {
    started: Arc<RwLock<Vec<(String, String, usize)>>>,
    finished_questions: Arc<RwLock<Vec<u32>>>,
    finished_runs: Arc<RwLock<Vec<String>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(exam_id, model_name, question_count)` per started run
    pub fn started(&self) -> Vec<(String, String, usize)> {
        self.started.read().clone()
    }

    /// Question numbers in completion order
    pub fn finished_questions(&self) -> Vec<u32> {
        self.finished_questions.read().clone()
    }

    /// Run ids of completed runs
    pub fn finished_runs(&self) -> Vec<String> {
        self.finished_runs.read().clone()
    }
}

impl EvaluationObserver for RecordingObserver {
    fn run_started(&self, exam: &Exam, model_name: &str, questions: usize) {
        self.started
            .write()
            .push((exam.exam_id.clone(), model_name.to_string(), questions));
    }

    fn question_finished(&self, result: &QuestionResult) {
        self.finished_questions.write().push(result.question_number);
    }

    fn run_finished(&self, run: &EvaluationRun) {
        self.finished_runs.write().push(run.run_id.to_string());
    }
}
