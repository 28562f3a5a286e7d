//! Progress callbacks for evaluation runs.

use exam_bench_domain::{EvaluationRun, Exam, QuestionResult};

/// Receives progress events while a run is in flight.
///
/// In concurrent mode `question_finished` is called from worker tasks in
/// completion order, so implementations must be thread-safe.
pub trait EvaluationObserver: Send + Sync {
    fn run_started(&self, _exam: &Exam, _model_name: &str, _questions: usize) {}

    fn question_finished(&self, _result: &QuestionResult) {}

    fn run_finished(&self, _run: &EvaluationRun) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl EvaluationObserver for NoOpObserver {}
