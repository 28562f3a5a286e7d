//! Terminal progress for evaluation runs

use colored::Colorize;
use exam_bench_application::EvaluationObserver;
use exam_bench_domain::{Correctness, EvaluationRun, Exam, QuestionOutcome, QuestionResult};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

/// Create a progress bar
pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// One line per finished question
pub fn question_line(result: &QuestionResult) -> String {
    let mark = match (result.outcome, result.is_correct) {
        (_, Correctness::Correct) => "✓".green(),
        (_, Correctness::Incorrect) => "✗".red(),
        (QuestionOutcome::Skipped, _) => "-".dimmed(),
        (QuestionOutcome::Failed, _) => "!".yellow(),
        (QuestionOutcome::Answered, Correctness::NotApplicable) => "?".dimmed(),
    };
    let answer = result
        .answer
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let key = result
        .correct_answer
        .as_ref()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "  {} Q{:>2}  answer {:<6} key {:<6} {:>6.2}s",
        mark, result.question_number, answer, key, result.time_taken
    );
    if let Some(error) = &result.error {
        line.push_str(&format!("  {}", error.dimmed()));
    }
    line
}

/// Observer that drives a progress bar and prints per-question lines
pub struct ProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: false,
        }
    }

    /// Observer that tracks progress without drawing anything
    pub fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: true,
        }
    }

    /// Position of the current bar, if a run is in flight
    pub fn position(&self) -> Option<u64> {
        self.bar.lock().as_ref().map(|bar| bar.position())
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationObserver for ProgressObserver {
    fn run_started(&self, exam: &Exam, model_name: &str, questions: usize) {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            progress_bar(questions as u64)
        };
        bar.set_length(questions as u64);
        bar.set_message(format!("{} · {}", exam.exam_id, model_name));
        *self.bar.lock() = Some(bar);
    }

    fn question_finished(&self, result: &QuestionResult) {
        if let Some(bar) = self.bar.lock().as_ref() {
            if !self.hidden {
                bar.println(question_line(result));
            }
            bar.inc(1);
        }
    }

    fn run_finished(&self, _run: &EvaluationRun) {
        if let Some(bar) = self.bar.lock().as_ref() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_bench_domain::{Answer, ModelResponse};
    use exam_bench_testing::{three_question_exam, QuestionBuilder};
    use std::time::Duration;

    #[test]
    fn test_progress_bar_creation() {
        let pb = progress_bar(100);
        assert_eq!(pb.length(), Some(100));
    }

    #[test]
    fn test_observer_advances_bar() {
        let observer = ProgressObserver::hidden();
        let exam = three_question_exam();
        observer.run_started(&exam, "stub", 3);

        let question = QuestionBuilder::multiple_choice(1, 1).build();
        let result = QuestionResult::skipped(&question, "blank");
        observer.question_finished(&result);
        observer.question_finished(&result);

        assert_eq!(observer.position(), Some(2));
    }

    #[test]
    fn test_question_line() {
        colored::control::set_override(false);
        let question = QuestionBuilder::multiple_choice(7, 3).build();
        let response =
            ModelResponse::answered("m", Answer::Choice(3), "", "", Duration::from_millis(1250));
        let result = QuestionResult::scored(&question, &response, Correctness::Correct);

        let line = question_line(&result);

        assert!(line.contains("✓ Q 7"));
        assert!(line.contains("answer 3"));
        assert!(line.contains("1.25s"));
    }

    #[test]
    fn test_question_line_shows_error() {
        colored::control::set_override(false);
        let question = QuestionBuilder::multiple_choice(2, 1).build();
        let result = QuestionResult::skipped(&question, "Question text is empty");

        let line = question_line(&result);

        assert!(line.starts_with("  - Q 2"));
        assert!(line.ends_with("Question text is empty"));
    }
}
