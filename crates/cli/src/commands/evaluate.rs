//! Evaluate models on exams
//!
//! Runs every selected (exam, model) pair in turn and stores one result file
//! per pair. A model without credentials, or with an unknown provider, is
//! reported and skipped; the rest of the batch still runs.

use super::CommandContext;
use crate::output::{colors, Formattable, TableFormatter};
use crate::progress::ProgressObserver;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use exam_bench_application::{
    build_adapter, discover_exams, load_exam, AdapterSettings, EvaluatorConfig, ExamEvaluator,
    PromptBuilder, ResultStore, RunOptions,
};
use exam_bench_common::{CredentialSource, EnvCredentials, ModelRegistry};
use exam_bench_domain::{EvaluationRun, Exam, ModelSpec, Provider, QuestionSelection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Exam file (YAML or JSON)
    #[arg(value_name = "EXAM", required_unless_present = "all")]
    pub exam: Option<PathBuf>,

    /// Evaluate every exam file in the exams directory
    #[arg(long, conflicts_with = "exam")]
    pub all: bool,

    /// Exams directory used by --all (overrides config)
    #[arg(long)]
    pub exams_dir: Option<PathBuf>,

    /// Model name or API identifier from the registry
    #[arg(short, long, conflicts_with_all = ["all_models", "provider"])]
    pub model: Option<String>,

    /// Evaluate every model in the registry
    #[arg(long, conflicts_with = "provider")]
    pub all_models: bool,

    /// Evaluate every model of one provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Question subset, e.g. `1-5,8,10-12`
    #[arg(short, long)]
    pub questions: Option<String>,

    /// Dispatch questions concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Concurrency bound for --parallel (overrides config)
    #[arg(long, requires = "parallel")]
    pub max_workers: Option<usize>,

    /// Result file path; only for a single exam and a single model
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for result files (overrides config)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Model registry file (overrides config)
    #[arg(long)]
    pub models_config: Option<PathBuf>,

    /// Write a verbose per-question log under the logs directory
    #[arg(long)]
    pub log_file: bool,
}

/// Which registry models to evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    One(String),
    Provider(Provider),
    All,
}

impl ModelChoice {
    pub fn from_args(args: &EvaluateArgs) -> Result<Self> {
        if let Some(name) = &args.model {
            return Ok(Self::One(name.clone()));
        }
        if let Some(provider) = &args.provider {
            return Ok(Self::Provider(provider.parse()?));
        }
        if args.all_models {
            return Ok(Self::All);
        }
        bail!("Specify --model <name>, --provider <provider> or --all-models")
    }
}

/// Resolve the model choice against the registry
pub fn select_models(registry: &ModelRegistry, choice: &ModelChoice) -> Result<Vec<ModelSpec>> {
    let models: Vec<ModelSpec> = match choice {
        ModelChoice::One(name) => match registry.find(name) {
            Some(spec) => vec![spec.clone()],
            None => bail!("Model '{}' not found in registry", name),
        },
        ModelChoice::Provider(provider) => {
            registry.by_provider(*provider).into_iter().cloned().collect()
        }
        ModelChoice::All => registry.models.clone(),
    };

    if models.is_empty() {
        bail!("No models selected");
    }
    Ok(models)
}

/// Exam files to evaluate
pub fn select_exams(args: &EvaluateArgs, default_dir: &Path) -> Result<Vec<PathBuf>> {
    if let Some(exam) = &args.exam {
        return Ok(vec![exam.clone()]);
    }

    let dir = args.exams_dir.as_deref().unwrap_or(default_dir);
    let exams = discover_exams(dir)?;
    if exams.is_empty() {
        bail!("No exam files found in {}", dir.display());
    }
    Ok(exams)
}

/// Outcome of one (exam, model) pair
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub exam: String,
    pub model: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Skipped,
    Failed,
}

impl RunReport {
    fn completed(run: &EvaluationRun, path: PathBuf) -> Self {
        Self {
            exam: run.exam_id.clone(),
            model: run.model_name.clone(),
            status: RunStatus::Completed,
            correct_answers: Some(run.summary.correct_answers),
            total_questions: Some(run.summary.total_questions),
            accuracy: Some(run.summary.accuracy),
            total_score: Some(run.summary.total_score),
            max_score: Some(run.summary.max_score),
            avg_time: Some(run.summary.avg_time),
            path: Some(path),
            error: None,
        }
    }

    fn not_run(exam: &str, model: &str, status: RunStatus, error: String) -> Self {
        Self {
            exam: exam.to_string(),
            model: model.to_string(),
            status,
            correct_answers: None,
            total_questions: None,
            accuracy: None,
            total_score: None,
            max_score: None,
            avg_time: None,
            path: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct BatchReport(pub Vec<RunReport>);

impl Formattable for BatchReport {
    fn format_table(&self) -> Result<String> {
        let rows = self
            .0
            .iter()
            .map(|report| {
                let status = match report.status {
                    RunStatus::Completed => colors::success("completed").to_string(),
                    RunStatus::Skipped => colors::warning("skipped").to_string(),
                    RunStatus::Failed => colors::error("failed").to_string(),
                };
                let correct = match (report.correct_answers, report.total_questions) {
                    (Some(correct), Some(total)) => format!("{}/{}", correct, total),
                    _ => "-".to_string(),
                };
                let score = match (report.total_score, report.max_score) {
                    (Some(score), Some(max)) => format!("{}/{}", score, max),
                    _ => "-".to_string(),
                };
                let detail = match (&report.path, &report.error) {
                    (Some(path), _) => path.display().to_string(),
                    (None, Some(error)) => error.clone(),
                    (None, None) => String::new(),
                };
                vec![
                    report.exam.clone(),
                    report.model.clone(),
                    status,
                    correct,
                    report
                        .accuracy
                        .map_or_else(|| "-".to_string(), |a| format!("{:.2}", a)),
                    score,
                    report
                        .avg_time
                        .map_or_else(|| "-".to_string(), |t| format!("{:.2}", t)),
                    detail,
                ]
            })
            .collect();

        TableFormatter::simple(
            vec![
                "Exam",
                "Model",
                "Status",
                "Correct",
                "Accuracy (%)",
                "Score",
                "Avg time (s)",
                "Result / Error",
            ],
            rows,
        )
    }
}

/// Run the evaluation batch
pub async fn run(ctx: &CommandContext, args: EvaluateArgs) -> Result<()> {
    let config = &ctx.config;
    let choice = ModelChoice::from_args(&args)?;
    let registry = ctx.load_registry(args.models_config.as_deref())?;
    let models = select_models(&registry, &choice)?;
    let exams = select_exams(&args, &config.paths.exams_dir)?;

    if args.output.is_some() && (exams.len() != 1 || models.len() != 1) {
        bail!("--output can only be used with a single exam and a single model");
    }

    let selection = args
        .questions
        .as_deref()
        .map(QuestionSelection::parse)
        .transpose()
        .context("Invalid --questions range")?;

    let options = if args.parallel {
        RunOptions::concurrent(args.max_workers.unwrap_or(config.evaluation.max_workers))
    } else {
        RunOptions::sequential()
    }
    .with_selection(selection);

    let observer = Arc::new(if ctx.format.is_structured() {
        ProgressObserver::hidden()
    } else {
        ProgressObserver::new()
    });
    let evaluator = ExamEvaluator::builder()
        .config(EvaluatorConfig {
            log_raw_output: args.log_file || ctx.verbose,
            ..EvaluatorConfig::from(&config.evaluation)
        })
        .observer(observer)
        .build();

    let credentials = EnvCredentials::with_dotenv();
    let settings = AdapterSettings::new(
        config.generation.clone(),
        PromptBuilder::from_config(&config.evaluation),
    );
    let store = ResultStore::new(ctx.results_dir(args.results_dir.clone()));

    info!(
        exams = exams.len(),
        models = models.len(),
        dispatch = ?options.dispatch,
        "Starting evaluation batch"
    );

    let mut reports = Vec::with_capacity(exams.len() * models.len());
    for exam_path in &exams {
        let exam = match load_exam(exam_path) {
            Ok(exam) => Arc::new(exam),
            Err(e) => {
                error!(path = %exam_path.display(), error = %e, "Failed to load exam");
                let name = exam_path.display().to_string();
                for spec in &models {
                    reports.push(RunReport::not_run(&name, &spec.name, RunStatus::Failed, e.to_string()));
                }
                continue;
            }
        };

        for spec in &models {
            let report = evaluate_pair(
                ctx,
                &evaluator,
                &store,
                &exam,
                spec,
                &credentials,
                &settings,
                &options,
                args.output.as_deref(),
            )
            .await;
            reports.push(report);
        }
    }

    ctx.print(&BatchReport(reports))
}

#[allow(clippy::too_many_arguments)]
async fn evaluate_pair(
    ctx: &CommandContext,
    evaluator: &ExamEvaluator,
    store: &ResultStore,
    exam: &Arc<Exam>,
    spec: &ModelSpec,
    credentials: &dyn CredentialSource,
    settings: &AdapterSettings,
    options: &RunOptions,
    output: Option<&Path>,
) -> RunReport {
    let adapter = match build_adapter(spec, credentials, settings) {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!(model = %spec.name, code = e.error_code(), error = %e, "Skipping model");
            if !ctx.format.is_structured() {
                eprintln!("{} {}: {}", "Skipping".yellow().bold(), spec.name, e);
            }
            let status = if e.skips_model_only() {
                RunStatus::Skipped
            } else {
                RunStatus::Failed
            };
            return RunReport::not_run(&exam.exam_id, &spec.name, status, e.to_string());
        }
    };

    let run = evaluator.evaluate(Arc::clone(exam), adapter, options).await;

    let saved = match output {
        Some(path) => store.save_to(path, &run).map(|_| path.to_path_buf()),
        None => store.save(&run),
    };

    match saved {
        Ok(path) => {
            if !ctx.format.is_structured() {
                print_run_summary(&run, &path);
            }
            RunReport::completed(&run, path)
        }
        Err(e) => {
            error!(exam_id = %run.exam_id, model = %run.model_name, error = %e, "Failed to save run");
            RunReport::not_run(&run.exam_id, &run.model_name, RunStatus::Failed, e.to_string())
        }
    }
}

fn print_run_summary(run: &EvaluationRun, path: &Path) {
    let summary = &run.summary;
    println!(
        "{} {} × {}: {}/{} correct ({:.2}%), score {}/{} ({:.2}%), avg {:.2}s",
        "✓".green().bold(),
        run.exam_id.bold(),
        run.model_name.bold(),
        summary.correct_answers,
        summary.total_questions,
        summary.accuracy,
        summary.total_score,
        summary.max_score,
        summary.score_rate,
        summary.avg_time,
    );
    println!("  {} {}", colors::dim("Saved to"), path.display());
}
