//! Leaderboard summary over stored runs

use super::CommandContext;
use crate::output::colors;
use anyhow::{bail, Result};
use clap::Args;
use exam_bench_application::{Aggregator, ResultStore, SummaryOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Directory holding stored runs (overrides config)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Show the board for one exam id
    #[arg(long, conflicts_with = "subject")]
    pub exam: Option<String>,

    /// Show the board for one subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Drop runs of models that are disabled in the registry
    #[arg(long)]
    pub enabled_only: bool,

    /// Model registry file used by --enabled-only (overrides config)
    #[arg(long)]
    pub models_config: Option<PathBuf>,
}

/// Build the aggregator for the requested runs
pub fn build_aggregator(ctx: &CommandContext, args: &SummaryArgs) -> Result<Aggregator> {
    let results_dir = ctx.results_dir(args.results_dir.clone());
    let runs = ResultStore::new(&results_dir).load_all()?;
    info!(results_dir = %results_dir.display(), runs = runs.len(), "Loaded stored runs");

    let mut options = SummaryOptions::from(&ctx.config.leaderboard);
    if args.enabled_only {
        let registry = ctx.load_registry(args.models_config.as_deref())?;
        options = options.with_allow_list(registry.enabled_identifiers());
    }

    Ok(Aggregator::new(runs, options))
}

/// Print leaderboards
pub fn show(ctx: &CommandContext, args: SummaryArgs) -> Result<()> {
    let aggregator = build_aggregator(ctx, &args)?;

    if aggregator.runs().is_empty() {
        let results_dir = ctx.results_dir(args.results_dir);
        println!(
            "{}",
            colors::warning(&format!("No results found in {}", results_dir.display()))
        );
        return Ok(());
    }

    if let Some(exam_id) = &args.exam {
        let board = aggregator.exam_leaderboard(exam_id);
        if board.is_empty() {
            bail!("No results for exam '{}'", exam_id);
        }
        return ctx.print(&board);
    }

    if let Some(subject) = &args.subject {
        let board = aggregator.subject_leaderboard(subject);
        if board.is_empty() {
            bail!("No results for subject '{}'", subject);
        }
        return ctx.print(&board);
    }

    ctx.print(&aggregator.export())
}
