//! Tracing and logging setup.
//!
//! Console logs go to stderr so that command output on stdout stays clean.
//! Verbose runs additionally write per-question diagnostics to a timestamped
//! log file through a non-blocking appender.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Directives used for the verbose log file
const FILE_DIRECTIVES: &str = "info,exam_bench_application=debug,exam_bench_cli=debug";

/// Options for [`init_tracing`]
#[derive(Debug, Clone, Default)]
pub struct TracingOptions {
    /// Console log level (overridden by `RUST_LOG`)
    pub level: String,
    /// Emit console logs as JSON
    pub json: bool,
    /// Also write debug-level logs to this file
    pub log_file: Option<PathBuf>,
}

/// Keeps the file writer alive; drop it only at process exit
#[must_use = "dropping the guard stops file logging"]
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber.
///
/// # Examples
///
/// ```no_run
/// use exam_bench_common::telemetry::{init_tracing, TracingOptions};
///
/// let _guard = init_tracing(&TracingOptions {
///     level: "info".into(),
///     ..Default::default()
/// })
/// .expect("Failed to initialize tracing");
/// ```
pub fn init_tracing(options: &TracingOptions) -> Result<TelemetryGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if options.json {
        layers.push(json_layer().with_filter(env_filter).boxed());
    } else {
        layers.push(pretty_layer().with_filter(env_filter).boxed());
    }

    let mut file_guard = None;
    if let Some(path) = &options.log_file {
        let (layer, guard) = file_layer(path)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(TelemetryGuard { _file: file_guard })
}

/// `{dir}/{prefix}_YYYYMMDD_HHMMSS.log` using local time
pub fn timestamped_log_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.log", prefix, stamp))
}

fn file_layer(path: &Path) -> Result<(Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path {} has no file name", path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(EnvFilter::new(FILE_DIRECTIVES))
        .boxed();

    Ok((layer, guard))
}

/// Create a JSON logging layer
fn json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .with_target(true)
        .with_level(true)
}

/// Create a human-readable logging layer
fn pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
}
