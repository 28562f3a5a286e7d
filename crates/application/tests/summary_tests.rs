//! Tests for leaderboard aggregation
//!
//! Tests per-exam, per-subject and overall boards, the listening-section
//! rule and model filtering.

use exam_bench_application::{Aggregator, ResultStore, SummaryOptions};
use exam_bench_common::LeaderboardConfig;
use exam_bench_domain::EvaluationRun;
use exam_bench_testing::tempfile::TempDir;
use exam_bench_testing::RunBuilder;
use std::collections::HashSet;

fn options() -> SummaryOptions {
    SummaryOptions::from(&LeaderboardConfig::default())
}

/// English run: 1-15 skipped as listening, 16-20 answered with `correct` right
fn english_run(model: &str, correct: u32) -> EvaluationRun {
    let mut builder = RunBuilder::new("2025-english", "english", model);
    for number in 1..=15 {
        builder = builder.skipped(number);
    }
    for number in 16..=20 {
        builder = builder.answered(number, number - 16 < correct, 1.0);
    }
    builder.build()
}

fn run_with(exam_id: &str, subject: &str, model: &str, outcomes: &[bool], seconds: f64) -> EvaluationRun {
    outcomes
        .iter()
        .enumerate()
        .fold(RunBuilder::new(exam_id, subject, model), |builder, (i, &correct)| {
            builder.answered(i as u32 + 1, correct, seconds)
        })
        .build()
}

// ============================================================================
// Listening Section
// ============================================================================

#[test]
fn test_english_subject_board_excludes_listening() {
    // Arrange
    let aggregator = Aggregator::new(vec![english_run("model-a", 4)], options());

    // Act
    let board = aggregator.subject_leaderboard("english");

    // Assert
    assert_eq!(board.title, "Subject: english");
    assert_eq!(board.rows.len(), 1);
    let row = &board.rows[0];
    assert_eq!(row.total_questions, 5);
    assert_eq!(row.correct_answers, 4);
    assert_eq!(row.accuracy, 80.0);
    assert_eq!(row.max_score, 10);
}

#[test]
fn test_overall_board_keeps_listening_items() {
    // Arrange
    let aggregator = Aggregator::new(vec![english_run("model-a", 4)], options());

    // Act
    let board = aggregator.overall_leaderboard();

    // Assert - skipped listening items still count as questions
    let row = &board.rows[0];
    assert_eq!(row.total_questions, 20);
    assert_eq!(row.accuracy, 20.0);
    assert_eq!(row.max_score, 40);
}

#[test]
fn test_listening_only_run_dropped_from_subject_board() {
    // Arrange
    let mut builder = RunBuilder::new("2024-english", "english", "model-a");
    for number in 1..=15 {
        builder = builder.skipped(number);
    }
    let aggregator = Aggregator::new(vec![builder.build()], options());

    // Assert
    assert!(aggregator.subject_leaderboard("english").is_empty());
    assert_eq!(aggregator.overall_leaderboard().rows.len(), 1);
}

// ============================================================================
// Averaging and Ordering
// ============================================================================

#[test]
fn test_cross_exam_mean_is_unweighted() {
    // Arrange - 1/1 on one exam, 0/3 on another
    let runs = vec![
        run_with("exam-1", "korean", "model-a", &[true], 1.0),
        run_with("exam-2", "korean", "model-a", &[false, false, false], 3.0),
    ];

    // Act
    let board = Aggregator::new(runs, options()).overall_leaderboard();

    // Assert
    let row = &board.rows[0];
    assert_eq!(row.accuracy, 50.0);
    assert_eq!(row.correct_answers, 1);
    assert_eq!(row.total_questions, 4);
    assert_eq!(row.total_score, 2);
    assert_eq!(row.max_score, 8);
    assert_eq!(row.avg_time, 2.0);
    assert_eq!(row.exams_count, 2);
}

#[test]
fn test_rows_sorted_by_accuracy_then_name() {
    // Arrange
    let runs = vec![
        run_with("exam-1", "math", "zeta", &[true, false], 1.0),
        run_with("exam-1", "math", "beta", &[true, true], 1.0),
        run_with("exam-1", "math", "alpha", &[true, true], 1.0),
    ];

    // Act
    let board = Aggregator::new(runs, options()).exam_leaderboard("exam-1");

    // Assert
    assert_eq!(board.title, "Exam: exam-1");
    let names: Vec<&str> = board.rows.iter().map(|r| r.model_name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "zeta"]);
}

#[test]
fn test_subject_board_groups_exams_by_subject() {
    // Arrange
    let runs = vec![
        run_with("2024-math", "math", "model-a", &[true, true], 1.0),
        run_with("2025-math", "math", "model-a", &[true, false], 1.0),
        run_with("2025-korean", "korean", "model-a", &[false, false], 1.0),
    ];

    // Act
    let board = Aggregator::new(runs, options()).subject_leaderboard("math");

    // Assert
    let row = &board.rows[0];
    assert_eq!(row.exams_count, 2);
    assert_eq!(row.accuracy, 75.0);
}

// ============================================================================
// Filtering and Statistics
// ============================================================================

#[test]
fn test_allow_list_excludes_models_before_averaging() {
    // Arrange
    let runs = vec![
        run_with("exam-1", "korean", "enabled-model", &[true, false], 1.0),
        run_with("exam-1", "korean", "disabled-model", &[true, true], 1.0),
    ];
    let allowed: HashSet<String> = ["enabled-model".to_string()].into_iter().collect();

    // Act
    let aggregator = Aggregator::new(runs, options().with_allow_list(allowed));

    // Assert
    let board = aggregator.overall_leaderboard();
    assert_eq!(board.rows.len(), 1);
    assert_eq!(board.rows[0].model_name, "enabled-model");
    assert_eq!(aggregator.statistics().models, 1);
}

#[test]
fn test_statistics() {
    // Arrange
    let runs = vec![
        run_with("exam-1", "korean", "a", &[true], 1.0),
        run_with("exam-2", "math", "a", &[true], 1.0),
        run_with("exam-1", "korean", "b", &[false], 1.0),
    ];

    // Act
    let stats = Aggregator::new(runs, options()).statistics();

    // Assert
    assert_eq!(stats.exams, 2);
    assert_eq!(stats.models, 2);
    assert_eq!(stats.runs, 3);
}

#[test]
fn test_export_omits_empty_subject_boards() {
    // Arrange
    let runs = vec![english_run("a", 5), english_run("b", 2)];

    // Act
    let export = Aggregator::new(runs, options()).export();

    // Assert
    assert_eq!(export.subjects.len(), 1);
    assert_eq!(export.subjects[0].title, "Subject: english");
    assert_eq!(export.exams.len(), 1);
    assert_eq!(export.overall.rows[0].model_name, "a");
    assert_eq!(export.statistics.runs, 2);
}

#[test]
fn test_empty_input() {
    let aggregator = Aggregator::new(Vec::new(), options());

    assert!(aggregator.overall_leaderboard().is_empty());
    assert!(aggregator.export().subjects.is_empty());
    assert_eq!(aggregator.statistics().runs, 0);
}

// ============================================================================
// Stored Runs
// ============================================================================

#[test]
fn test_aggregate_stored_runs() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path());
    store.save(&english_run("model-a", 3)).unwrap();
    store
        .save(&run_with("2025-math", "math", "model-a", &[true, true], 2.0))
        .unwrap();

    // Act
    let runs = store.load_all().unwrap();
    let export = Aggregator::new(runs, options()).export();

    // Assert
    assert_eq!(export.statistics.runs, 2);
    assert_eq!(export.statistics.exams, 2);
    assert_eq!(export.subjects.len(), 2);
    assert_eq!(export.overall.rows[0].exams_count, 2);
}
