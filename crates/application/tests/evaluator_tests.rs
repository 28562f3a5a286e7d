//! Tests for exam evaluation
//!
//! Covers skipping, scoring, dispatch modes, failure isolation and progress events.

use async_trait::async_trait;
use exam_bench_application::{ExamEvaluator, ModelAdapter, RunOptions, SolveRequest};
use exam_bench_domain::{
    Answer, Correctness, DispatchMode, Exam, ModelResponse, QuestionOutcome, QuestionSelection,
};
use exam_bench_testing::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn question_text(number: u32) -> String {
    format!("{}번 문제: 윗글의 내용으로 적절한 것은?", number)
}

async fn run(exam: Exam, adapter: Arc<dyn ModelAdapter>, options: RunOptions) -> exam_bench_domain::EvaluationRun {
    ExamEvaluator::builder()
        .build()
        .evaluate(Arc::new(exam), adapter, &options)
        .await
}

// ============================================================================
// Scoring Scenarios
// ============================================================================

#[tokio::test]
async fn test_three_question_scenario() {
    // Arrange - keys are 1, 2, 3; the model answers 1, 5, 3
    let adapter = ScriptedAdapter::new("scripted")
        .answer(question_text(1), Answer::Choice(1))
        .answer(question_text(2), Answer::Choice(5))
        .answer(question_text(3), Answer::Choice(3));

    // Act
    let run = run(three_question_exam(), Arc::new(adapter), RunOptions::sequential()).await;

    // Assert
    assert_eq!(run.summary.total_questions, 3);
    assert_eq!(run.summary.correct_answers, 2);
    assert_eq!(run.summary.accuracy, 66.67);
    assert_eq!(run.summary.total_score, 4);
    assert_eq!(run.summary.max_score, 6);
    assert_eq!(run.summary.score_rate, 66.67);

    let verdicts: Vec<Correctness> = run.results.iter().map(|r| r.is_correct).collect();
    assert_eq!(
        verdicts,
        vec![Correctness::Correct, Correctness::Incorrect, Correctness::Correct]
    );
    assert_eq!(run.results[1].earned_points, 0);
}

#[tokio::test]
async fn test_free_response_within_tolerance() {
    // Arrange - 5.505 vs key 5.5 differs by less than 0.01
    let adapter = ScriptedAdapter::new("scripted")
        .answer(question_text(1), Answer::Choice(4))
        .answer("22번 문제: 값을 구하시오.", Answer::Numeric(5.505));

    // Act
    let run = run(math_exam(), Arc::new(adapter), RunOptions::sequential()).await;

    // Assert
    assert_eq!(run.summary.correct_answers, 2);
    assert_eq!(run.summary.total_score, 6);
    assert_eq!(run.results[1].answer, Some(Answer::Numeric(5.505)));
}

#[tokio::test]
async fn test_unkeyed_question_is_not_applicable() {
    // Arrange
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(3)));

    // Act
    let run = run(korean_exam(), adapter.clone(), RunOptions::sequential()).await;

    // Assert - Q1 key 3 correct, Q2 key 5 wrong, Q3 blank, Q4 unkeyed
    let q4 = &run.results[3];
    assert_eq!(q4.question_number, 4);
    assert!(q4.success);
    assert_eq!(q4.is_correct, Correctness::NotApplicable);
    assert_eq!(q4.earned_points, 0);
    assert_eq!(run.summary.correct_answers, 1);
    assert_eq!(run.summary.max_score, 8);
}

// ============================================================================
// Skipping
// ============================================================================

#[tokio::test]
async fn test_blank_question_never_dispatched() {
    // Arrange
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));

    // Act
    let run = run(korean_exam(), adapter.clone(), RunOptions::sequential()).await;

    // Assert
    assert_eq!(adapter.call_count(), 3);
    assert!(!adapter.received().iter().any(|text| text.trim().is_empty()));

    let blank = &run.results[2];
    assert_eq!(blank.outcome, QuestionOutcome::Skipped);
    assert_eq!(blank.is_correct, Correctness::NotApplicable);
    assert_eq!(blank.error.as_deref(), Some("Question text is empty"));
}

#[tokio::test]
async fn test_listening_questions_skipped_but_counted() {
    // Arrange
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));

    // Act
    let run = run(listening_exam(), adapter.clone(), RunOptions::sequential()).await;

    // Assert - only reading questions 16-20 reach the model
    assert_eq!(adapter.call_count(), 5);
    assert_eq!(run.summary.total_questions, 20);
    assert_eq!(run.summary.correct_answers, 5);
    assert_eq!(run.summary.accuracy, 25.0);
    assert_eq!(run.summary.max_score, 40);
    assert_eq!(run.summary.total_score, 10);

    let skipped = run
        .results
        .iter()
        .filter(|r| r.outcome == QuestionOutcome::Skipped)
        .count();
    assert_eq!(skipped, 15);
    assert!(run.results[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("Skipped: excluded category"));
}

#[tokio::test]
async fn test_custom_skip_markers() {
    // Arrange - no markers means listening items are dispatched too
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));
    let evaluator = ExamEvaluator::builder().skip_markers(vec![]).build();

    // Act
    let run = evaluator
        .evaluate(Arc::new(listening_exam()), adapter.clone(), &RunOptions::sequential())
        .await;

    // Assert
    assert_eq!(adapter.call_count(), 20);
    assert_eq!(run.summary.correct_answers, 20);
}

// ============================================================================
// Passages and Subsets
// ============================================================================

#[tokio::test]
async fn test_embedded_passage_takes_precedence() {
    // Arrange
    let adapter = Arc::new(ScriptedAdapter::new("scripted"));

    // Act
    run(korean_exam(), adapter.clone(), RunOptions::sequential()).await;

    // Assert - Q1 resolves p1, Q2 uses its embedded passage, Q4 has none
    let passages = adapter.passages_seen();
    assert_eq!(passages.len(), 3);
    assert_eq!(
        passages[0].as_deref(),
        Some("독서는 글을 읽고 의미를 구성하는 과정이다.")
    );
    assert_eq!(passages[1].as_deref(), Some("(가) 별도 지문"));
    assert_eq!(passages[2], None);
}

#[tokio::test]
async fn test_question_subset() {
    // Arrange
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));
    let selection = QuestionSelection::parse("1,3").unwrap();
    let options = RunOptions::sequential().with_selection(Some(selection.clone()));

    // Act
    let run = run(three_question_exam(), adapter.clone(), options).await;

    // Assert
    let numbers: Vec<u32> = run.results.iter().map(|r| r.question_number).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(run.summary.max_score, 4);
    assert_eq!(run.question_filter, Some(selection));
    assert_eq!(adapter.call_count(), 2);
}

#[tokio::test]
async fn test_subset_outside_exam_is_empty() {
    // Arrange
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));
    let options = RunOptions::sequential().with_selection(Some(QuestionSelection::parse("40-45").unwrap()));

    // Act
    let run = run(three_question_exam(), adapter.clone(), options).await;

    // Assert
    assert!(run.results.is_empty());
    assert_eq!(run.summary.accuracy, 0.0);
    assert_eq!(run.summary.score_rate, 0.0);
    assert_eq!(adapter.call_count(), 0);
}

// ============================================================================
// Dispatch Modes
// ============================================================================

#[tokio::test]
async fn test_sequential_and_concurrent_agree() {
    // Arrange
    let sequential = Arc::new(StubAdapter::new("stub", Answer::Choice(1)).with_delay(Duration::from_millis(5)));
    let concurrent = Arc::new(StubAdapter::new("stub", Answer::Choice(1)).with_delay(Duration::from_millis(5)));

    // Act
    let a = run(listening_exam(), sequential, RunOptions::sequential()).await;
    let b = run(listening_exam(), concurrent, RunOptions::concurrent(4)).await;

    // Assert
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.results, b.results);
    assert_eq!(b.dispatch, DispatchMode::Concurrent { max_workers: 4 });
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    // Arrange
    let adapter: Arc<dyn ModelAdapter> = Arc::new(StubAdapter::new("stub", Answer::Choice(2)));
    let evaluator = ExamEvaluator::builder().build();
    let exam = Arc::new(three_question_exam());

    // Act
    let first = evaluator
        .evaluate(Arc::clone(&exam), Arc::clone(&adapter), &RunOptions::concurrent(3))
        .await;
    let second = evaluator
        .evaluate(exam, adapter, &RunOptions::concurrent(3))
        .await;

    // Assert
    assert_eq!(first.results, second.results);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_sequential_rerun_is_idempotent() {
    // Arrange
    let adapter: Arc<dyn ModelAdapter> = Arc::new(
        ScriptedAdapter::new("scripted")
            .answer(question_text(1), Answer::Choice(1))
            .answer(question_text(2), Answer::Choice(4))
            .answer(question_text(3), Answer::Choice(3)),
    );
    let evaluator = ExamEvaluator::builder().build();
    let exam = Arc::new(three_question_exam());

    // Act
    let first = evaluator
        .evaluate(Arc::clone(&exam), Arc::clone(&adapter), &RunOptions::sequential())
        .await;
    let second = evaluator
        .evaluate(exam, adapter, &RunOptions::sequential())
        .await;

    // Assert
    assert_eq!(first.results, second.results);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.summary.correct_answers, 2);
    assert_eq!(first.dispatch, DispatchMode::Sequential);
}

/// Adapter that tracks how many calls are in flight at once
struct GaugeAdapter {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ModelAdapter for GaugeAdapter {
    fn model_name(&self) -> &str {
        "gauge"
    }

    async fn solve(&self, _request: &SolveRequest<'_>) -> ModelResponse {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        ModelResponse::answered("gauge", Answer::Choice(1), "", "", Duration::ZERO)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bounded_by_workers() {
    // Arrange
    let adapter = Arc::new(GaugeAdapter {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let evaluator = ExamEvaluator::builder().skip_markers(vec![]).build();

    // Act
    let run = evaluator
        .evaluate(Arc::new(listening_exam()), adapter.clone(), &RunOptions::concurrent(3))
        .await;

    // Assert
    assert_eq!(run.results.len(), 20);
    let peak = adapter.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency was {}", peak);
    assert!(peak >= 1);
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[tokio::test]
async fn test_failing_adapter_scores_not_applicable() {
    // Arrange
    let adapter = Arc::new(FailingAdapter::new("down", "HTTP 503: Service Unavailable"));

    // Act
    let run = run(three_question_exam(), adapter, RunOptions::concurrent(2)).await;

    // Assert
    assert_eq!(run.summary.total_questions, 3);
    assert_eq!(run.summary.correct_answers, 0);
    assert_eq!(run.summary.max_score, 6);
    for result in &run.results {
        assert!(!result.success);
        assert_eq!(result.outcome, QuestionOutcome::Failed);
        assert_eq!(result.is_correct, Correctness::NotApplicable);
        assert_eq!(result.answer, None);
    }
    assert_eq!(run.unanswered().count(), 3);
}

#[tokio::test]
async fn test_panicking_task_does_not_abort_run() {
    // Arrange
    let adapter = Arc::new(PanickingAdapter::new("fragile", "2번", Answer::Choice(1)));

    // Act
    let run = run(three_question_exam(), adapter, RunOptions::concurrent(2)).await;

    // Assert
    assert_eq!(run.results.len(), 3);
    assert_eq!(run.results[0].is_correct, Correctness::Correct);
    assert_eq!(run.results[1].outcome, QuestionOutcome::Failed);
    assert!(run.results[1]
        .error
        .as_deref()
        .unwrap()
        .starts_with("Question task aborted"));
    assert_eq!(run.results[2].is_correct, Correctness::Incorrect);
}

#[tokio::test]
async fn test_panicking_question_is_isolated_in_sequential_mode() {
    // Arrange
    let adapter = Arc::new(PanickingAdapter::new("fragile", "2번", Answer::Choice(1)));

    // Act
    let run = run(three_question_exam(), adapter, RunOptions::sequential()).await;

    // Assert
    assert_eq!(run.results.len(), 3);
    assert_eq!(run.results[0].is_correct, Correctness::Correct);
    assert_eq!(run.results[1].outcome, QuestionOutcome::Failed);
    assert_eq!(run.results[1].is_correct, Correctness::NotApplicable);
    let error = run.results[1].error.as_deref().unwrap();
    assert!(error.starts_with("Question task aborted: adapter crashed on 2번"));
    assert_eq!(run.results[2].is_correct, Correctness::Incorrect);
    assert_eq!(run.summary.correct_answers, 1);
}

#[tokio::test]
async fn test_panicking_question_scores_the_same_in_both_modes() {
    // Arrange
    let sequential = Arc::new(PanickingAdapter::new("fragile", "2번", Answer::Choice(1)));
    let concurrent = Arc::new(PanickingAdapter::new("fragile", "2번", Answer::Choice(1)));

    // Act
    let a = run(three_question_exam(), sequential, RunOptions::sequential()).await;
    let b = run(three_question_exam(), concurrent, RunOptions::concurrent(2)).await;

    // Assert
    assert_eq!(a.results, b.results);
    assert_eq!(a.summary, b.summary);
}

#[tokio::test]
async fn test_raw_output_without_answer_fails_question() {
    // Arrange
    let adapter = Arc::new(RawOutputAdapter::new("chatty", "잘 모르겠습니다."));

    // Act
    let run = run(three_question_exam(), adapter, RunOptions::sequential()).await;

    // Assert
    assert!(run.results.iter().all(|r| !r.success));
    assert_eq!(run.summary.correct_answers, 0);
}

// ============================================================================
// Progress Events
// ============================================================================

#[tokio::test]
async fn test_observer_receives_events() {
    // Arrange
    let observer = Arc::new(RecordingObserver::new());
    let evaluator = ExamEvaluator::builder().observer(observer.clone()).build();
    let adapter = Arc::new(StubAdapter::new("stub", Answer::Choice(1)));

    // Act
    let run = evaluator
        .evaluate(Arc::new(three_question_exam()), adapter, &RunOptions::sequential())
        .await;

    // Assert
    assert_eq!(
        observer.started(),
        vec![("scenario-2025".to_string(), "stub".to_string(), 3)]
    );
    assert_eq!(observer.finished_questions(), vec![1, 2, 3]);
    assert_eq!(observer.finished_runs(), vec![run.run_id.to_string()]);
}

#[tokio::test]
async fn test_observer_sees_every_concurrent_question() {
    // Arrange
    let observer = Arc::new(RecordingObserver::new());
    let evaluator = ExamEvaluator::builder().observer(observer.clone()).build();
    let adapter = Arc::new(PanickingAdapter::new("fragile", "3번", Answer::Choice(1)));

    // Act
    evaluator
        .evaluate(Arc::new(three_question_exam()), adapter, &RunOptions::concurrent(3))
        .await;

    // Assert
    let mut finished = observer.finished_questions();
    finished.sort_unstable();
    assert_eq!(finished, vec![1, 2, 3]);
}
