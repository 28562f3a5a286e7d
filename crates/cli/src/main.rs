//! Exam benchmark CLI
//!
//! Evaluates LLMs on structured exams and prints leaderboards over stored runs.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use exam_bench_cli::commands::{evaluate, models, summary, CommandContext};
use exam_bench_cli::output::OutputFormat;
use exam_bench_common::{init_tracing, timestamped_log_path, AppConfig, TracingOptions};
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum CliOutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Table output (default)
    #[default]
    Table,
    /// Plain text output
    Plain,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Yaml => OutputFormat::Yaml,
            CliOutputFormat::Table => OutputFormat::Table,
            CliOutputFormat::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "exam-bench")]
#[command(author, version, about = "Evaluate LLMs on structured exams")]
#[command(long_about = "Evaluate LLMs on structured multiple-choice and free-response exams.\n\n\
    Runs models from several providers against exam files, stores one result file per \
    (exam, model) pair and aggregates stored runs into leaderboards.")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value = "table")]
    format: CliOutputFormat,

    /// Configuration file (overrides config/default.toml layering)
    #[arg(short, long, global = true, env = "EXAM_BENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate models on one exam or every exam in a directory
    #[command(alias = "eval")]
    Evaluate(evaluate::EvaluateArgs),

    /// Show leaderboards over stored results
    #[command(alias = "board")]
    Summary(summary::SummaryArgs),

    /// List registered models and their credential status
    Models(models::ModelsArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "exam-bench", &mut std::io::stdout());
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Handle completions command early (doesn't need config)
    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let log_file = match &cli.command {
        Commands::Evaluate(args) if args.log_file => {
            Some(timestamped_log_path(&config.paths.logs_dir, "evaluation"))
        }
        _ => None,
    };
    let guard = init_tracing(&TracingOptions {
        level: if cli.verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        json: config.logging.json,
        log_file,
    })?;

    let ctx = CommandContext::new(config, cli.format.into(), cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Evaluate(args) => evaluate::run(&ctx, args).await,
        Commands::Summary(args) => summary::show(&ctx, args),
        Commands::Models(args) => models::list(&ctx, args),
        Commands::Completions { .. } => {
            // Already handled above
            Ok(())
        }
    };

    if let Err(e) = result {
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), e);
        if cli.verbose {
            eprintln!("\n{}", "Details:".dimmed());
            eprintln!("{:?}", e);
        }
        drop(guard);
        std::process::exit(1);
    }

    Ok(())
}
