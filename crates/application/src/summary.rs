//! Leaderboards over stored evaluation runs.
//!
//! Every board groups runs by model and takes a simple (unweighted) mean of
//! the per-run accuracy, score rate and average time; score and question
//! counts are summed. Runs for models outside the allow-list are dropped
//! before any aggregation so they cannot move an average.
//!
//! The listening subject mixes ungraded listening items with graded reading
//! items. Its subject board recomputes each run's summary over questions
//! above the listening cutoff only, before averaging.

use exam_bench_common::LeaderboardConfig;
use exam_bench_domain::{round2, EvaluationRun, RunSummary};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Aggregation settings
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Subjects that get their own board
    pub subjects: Vec<String>,
    /// Subject whose low-numbered questions are listening items
    pub listening_subject: String,
    /// Questions numbered at or below this are excluded for the listening subject
    pub listening_cutoff: u32,
    /// Model names / API ids to keep; `None` keeps every run
    pub allow_list: Option<HashSet<String>>,
}

impl SummaryOptions {
    pub fn with_allow_list(mut self, allow_list: HashSet<String>) -> Self {
        self.allow_list = Some(allow_list);
        self
    }
}

impl From<&LeaderboardConfig> for SummaryOptions {
    fn from(config: &LeaderboardConfig) -> Self {
        Self {
            subjects: config.subjects.clone(),
            listening_subject: config.listening_subject.clone(),
            listening_cutoff: config.listening_cutoff,
            allow_list: None,
        }
    }
}

/// One model's line on a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub model_name: String,
    pub accuracy: f64,
    pub score_rate: f64,
    pub total_score: u32,
    pub max_score: u32,
    pub correct_answers: usize,
    pub total_questions: usize,
    /// Mean of per-run average seconds per question
    pub avg_time: f64,
    pub exams_count: usize,
}

/// A titled, sorted list of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub title: String,
    pub rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Counts over the aggregated runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub exams: usize,
    pub models: usize,
    pub runs: usize,
}

/// Everything the summary command can show, in one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardExport {
    pub statistics: Statistics,
    pub overall: Leaderboard,
    pub subjects: Vec<Leaderboard>,
    pub exams: Vec<Leaderboard>,
}

/// Aggregates a set of runs into leaderboards
#[derive(Debug, Clone)]
pub struct Aggregator {
    runs: Vec<EvaluationRun>,
    options: SummaryOptions,
}

impl Aggregator {
    /// Keep only allowed runs; excluded runs never reach any board
    pub fn new(runs: Vec<EvaluationRun>, options: SummaryOptions) -> Self {
        let total = runs.len();
        let runs: Vec<EvaluationRun> = match &options.allow_list {
            Some(allowed) => runs
                .into_iter()
                .filter(|run| allowed.contains(&run.model_name))
                .collect(),
            None => runs,
        };
        debug!(kept = runs.len(), dropped = total - runs.len(), "Filtered runs for aggregation");
        Self { runs, options }
    }

    pub fn runs(&self) -> &[EvaluationRun] {
        &self.runs
    }

    pub fn statistics(&self) -> Statistics {
        let exams: BTreeSet<&str> = self.runs.iter().map(|r| r.exam_id.as_str()).collect();
        let models: BTreeSet<&str> = self.runs.iter().map(|r| r.model_name.as_str()).collect();
        Statistics {
            exams: exams.len(),
            models: models.len(),
            runs: self.runs.len(),
        }
    }

    pub fn exam_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.runs.iter().map(|r| r.exam_id.as_str()).collect();
        ids.into_iter().map(str::to_string).collect()
    }

    /// One row per model for a single exam
    pub fn exam_leaderboard(&self, exam_id: &str) -> Leaderboard {
        let entries = self
            .runs
            .iter()
            .filter(|run| run.exam_id == exam_id)
            .map(|run| (run, run.summary.clone()));
        Leaderboard {
            title: format!("Exam: {}", exam_id),
            rows: aggregate(entries),
        }
    }

    /// One row per model across every exam
    pub fn overall_leaderboard(&self) -> Leaderboard {
        let entries = self.runs.iter().map(|run| (run, run.summary.clone()));
        Leaderboard {
            title: "Overall".to_string(),
            rows: aggregate(entries),
        }
    }

    /// One row per model over runs of one subject
    pub fn subject_leaderboard(&self, subject: &str) -> Leaderboard {
        let listening = subject.eq_ignore_ascii_case(&self.options.listening_subject);
        let cutoff = self.options.listening_cutoff;

        let entries = self
            .runs
            .iter()
            .filter(|run| run.subject.eq_ignore_ascii_case(subject))
            .map(|run| {
                let summary = if listening {
                    run.summary_where(|result| result.question_number > cutoff)
                } else {
                    run.summary.clone()
                };
                (run, summary)
            })
            .filter(|(_, summary)| summary.total_questions > 0);

        Leaderboard {
            title: format!("Subject: {}", subject),
            rows: aggregate(entries),
        }
    }

    /// Statistics plus overall, subject and per-exam boards
    pub fn export(&self) -> LeaderboardExport {
        LeaderboardExport {
            statistics: self.statistics(),
            overall: self.overall_leaderboard(),
            subjects: self
                .options
                .subjects
                .iter()
                .map(|subject| self.subject_leaderboard(subject))
                .filter(|board| !board.is_empty())
                .collect(),
            exams: self
                .exam_ids()
                .iter()
                .map(|exam_id| self.exam_leaderboard(exam_id))
                .collect(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        round2(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn aggregate<'a, I>(entries: I) -> Vec<LeaderboardRow>
where
    I: IntoIterator<Item = (&'a EvaluationRun, RunSummary)>,
{
    let mut by_model: BTreeMap<&str, Vec<(&str, RunSummary)>> = BTreeMap::new();
    for (run, summary) in entries {
        by_model
            .entry(run.model_name.as_str())
            .or_default()
            .push((run.exam_id.as_str(), summary));
    }

    let mut rows: Vec<LeaderboardRow> = by_model
        .into_iter()
        .map(|(model_name, runs)| {
            let exams: BTreeSet<&str> = runs.iter().map(|(exam_id, _)| *exam_id).collect();
            let accuracies: Vec<f64> = runs.iter().map(|(_, s)| s.accuracy).collect();
            let score_rates: Vec<f64> = runs.iter().map(|(_, s)| s.score_rate).collect();
            let times: Vec<f64> = runs.iter().map(|(_, s)| s.avg_time).collect();

            LeaderboardRow {
                model_name: model_name.to_string(),
                accuracy: mean(&accuracies),
                score_rate: mean(&score_rates),
                total_score: runs.iter().map(|(_, s)| s.total_score).sum(),
                max_score: runs.iter().map(|(_, s)| s.max_score).sum(),
                correct_answers: runs.iter().map(|(_, s)| s.correct_answers).sum(),
                total_questions: runs.iter().map(|(_, s)| s.total_questions).sum(),
                avg_time: mean(&times),
                exams_count: exams.len(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.accuracy
            .total_cmp(&a.accuracy)
            .then_with(|| b.score_rate.total_cmp(&a.score_rate))
            .then_with(|| a.model_name.cmp(&b.model_name))
    });
    rows
}
