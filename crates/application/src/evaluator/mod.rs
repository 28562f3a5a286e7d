//! Evaluator - runs one model over one exam and scores every answer
//!
//! Each selected question moves through `pending -> dispatched ->
//! {answered | skipped | failed} -> scored`. Skipped questions never reach the
//! adapter. Failed adapter calls are recorded as not-applicable and never stop
//! the remaining questions.
//!
//! Sequential and concurrent dispatch produce identical results for
//! identical model outputs; results are always sorted by question number
//! and folded into the summary only after every task has finished.

mod context;
mod observer;

pub use context::SkipReason;
pub use observer::{EvaluationObserver, NoOpObserver};

use crate::adapters::ModelAdapter;
use crate::scoring::{ScoringEngine, ScoringEngineConfig};
use context::RunContext;
use exam_bench_common::EvaluationConfig;
use exam_bench_domain::{DispatchMode, EvaluationRun, Exam, QuestionResult, QuestionSelection};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};

/// Evaluator configuration
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Question-text markers that exclude a question from dispatch
    pub skip_markers: Vec<String>,
    /// Absolute tolerance for free-response answers
    pub free_response_tolerance: f64,
    /// Log raw model output for every question
    pub log_raw_output: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::from(&EvaluationConfig::default())
    }
}

impl From<&EvaluationConfig> for EvaluatorConfig {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            skip_markers: config.skip_markers.clone(),
            free_response_tolerance: config.free_response_tolerance,
            log_raw_output: false,
        }
    }
}

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dispatch: DispatchMode,
    pub selection: Option<QuestionSelection>,
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn concurrent(max_workers: usize) -> Self {
        Self {
            dispatch: DispatchMode::Concurrent { max_workers },
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: Option<QuestionSelection>) -> Self {
        self.selection = selection;
        self
    }
}

/// Evaluates exams against model adapters
pub struct ExamEvaluator {
    config: EvaluatorConfig,
    scoring: Arc<ScoringEngine>,
    skip_markers: Arc<[String]>,
    observer: Arc<dyn EvaluationObserver>,
}

impl ExamEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        let scoring = ScoringEngine::new(ScoringEngineConfig {
            free_response_tolerance: config.free_response_tolerance,
        });
        Self {
            skip_markers: config.skip_markers.clone().into(),
            scoring: Arc::new(scoring),
            observer: Arc::new(NoOpObserver),
            config,
        }
    }

    pub fn builder() -> ExamEvaluatorBuilder {
        ExamEvaluatorBuilder::new()
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate one exam with one model
    #[instrument(
        skip(self, exam, adapter, options),
        fields(exam_id = %exam.exam_id, model = %adapter.model_name(), dispatch = ?options.dispatch)
    )]
    pub async fn evaluate(
        &self,
        exam: Arc<Exam>,
        adapter: Arc<dyn ModelAdapter>,
        options: &RunOptions,
    ) -> EvaluationRun {
        let indices = selected_indices(&exam, options.selection.as_ref());
        let model_name = adapter.model_name().to_string();
        self.observer.run_started(&exam, &model_name, indices.len());
        info!(questions = indices.len(), "Starting evaluation");

        let context = Arc::new(RunContext::new(
            Arc::clone(&exam),
            adapter,
            Arc::clone(&self.scoring),
            Arc::clone(&self.skip_markers),
            Arc::clone(&self.observer),
            self.config.log_raw_output,
        ));

        let results = match options.dispatch {
            DispatchMode::Sequential => run_sequential(&context, &indices).await,
            DispatchMode::Concurrent { max_workers } => {
                run_concurrent(&context, &indices, max_workers).await
            }
        };

        let run = EvaluationRun::new(
            &exam,
            model_name,
            options.dispatch,
            options.selection.clone(),
            results,
        );
        info!(
            correct = run.summary.correct_answers,
            total = run.summary.total_questions,
            accuracy = run.summary.accuracy,
            score = run.summary.total_score,
            max_score = run.summary.max_score,
            "Evaluation finished"
        );
        self.observer.run_finished(&run);
        run
    }
}

/// Indices of the selected questions in ascending question-number order
fn selected_indices(exam: &Exam, selection: Option<&QuestionSelection>) -> Vec<usize> {
    let mut indices: Vec<usize> = exam
        .questions
        .iter()
        .enumerate()
        .filter(|(_, q)| selection.map_or(true, |s| s.contains(q.question_number)))
        .map(|(index, _)| index)
        .collect();
    indices.sort_by_key(|&index| exam.questions[index].question_number);
    indices
}

async fn run_sequential(context: &RunContext, indices: &[usize]) -> Vec<QuestionResult> {
    let mut results = Vec::with_capacity(indices.len());
    for &index in indices {
        let result = match AssertUnwindSafe(context.evaluate(index)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => aborted(context, index, panic_message(payload.as_ref())),
        };
        context.observer.question_finished(&result);
        results.push(result);
    }
    results
}

async fn run_concurrent(
    context: &Arc<RunContext>,
    indices: &[usize],
    max_workers: usize,
) -> Vec<QuestionResult> {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));

    let handles: Vec<_> = indices
        .iter()
        .map(|&index| {
            let context = Arc::clone(context);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => context.evaluate(index).await,
                    Err(_) => context.failed(index, "Worker pool closed"),
                };
                context.observer.question_finished(&result);
                result
            })
        })
        .collect();

    let joined = join_all(handles).await;

    indices
        .iter()
        .zip(joined)
        .map(|(&index, outcome)| match outcome {
            Ok(result) => result,
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic().as_ref())
                } else {
                    join_error.to_string()
                };
                let result = aborted(context, index, reason);
                context.observer.question_finished(&result);
                result
            }
        })
        .collect()
}

/// Failed result for a question whose task panicked or was cancelled
fn aborted(context: &RunContext, index: usize, reason: String) -> QuestionResult {
    let question_number = context.exam.questions[index].question_number;
    error!(question_number, error = %reason, "Question task aborted");
    context.failed(index, format!("Question task aborted: {}", reason))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

/// Builder for ExamEvaluator
pub struct ExamEvaluatorBuilder {
    config: EvaluatorConfig,
    scoring: Option<ScoringEngine>,
    observer: Option<Arc<dyn EvaluationObserver>>,
}

impl ExamEvaluatorBuilder {
    pub fn new() -> Self {
        Self {
            config: EvaluatorConfig::default(),
            scoring: None,
            observer: None,
        }
    }

    pub fn config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn skip_markers(mut self, markers: Vec<String>) -> Self {
        self.config.skip_markers = markers;
        self
    }

    pub fn log_raw_output(mut self, enabled: bool) -> Self {
        self.config.log_raw_output = enabled;
        self
    }

    /// Use a custom scoring engine instead of one built from the config
    pub fn scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn EvaluationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> ExamEvaluator {
        let mut evaluator = ExamEvaluator::new(self.config);
        if let Some(scoring) = self.scoring {
            evaluator.scoring = Arc::new(scoring);
        }
        if let Some(observer) = self.observer {
            evaluator.observer = observer;
        }
        evaluator
    }
}

impl Default for ExamEvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_bench_domain::Question;

    fn question(number: u32) -> Question {
        Question {
            question_id: String::new(),
            question_number: number,
            question_text: format!("문제 {}", number),
            choices: vec!["a".into(); 5],
            passage_id: None,
            passage: None,
            correct_answer: None,
            points: 2,
            subject_type: None,
        }
    }

    #[test]
    fn test_selected_indices_sorted_by_number() {
        let exam = Exam {
            exam_id: "e".into(),
            title: String::new(),
            subject: "korean".into(),
            year: None,
            passages: vec![],
            questions: vec![question(3), question(1), question(2), question(10)],
        };

        assert_eq!(selected_indices(&exam, None), vec![1, 2, 0, 3]);

        let selection = QuestionSelection::parse("2-3").unwrap();
        assert_eq!(selected_indices(&exam, Some(&selection)), vec![2, 0]);
    }

    #[test]
    fn test_run_options() {
        let options = RunOptions::concurrent(4);
        assert_eq!(options.dispatch, DispatchMode::Concurrent { max_workers: 4 });
        assert_eq!(RunOptions::sequential().dispatch, DispatchMode::Sequential);
    }
}
