//! exam-bench CLI library
//!
//! Command implementations, progress reporting and output formatting for the
//! `exam-bench` binary.

pub mod commands;
pub mod output;
pub mod progress;

pub use commands::CommandContext;
pub use output::{JsonFormatter, OutputFormat, PlainFormatter, TableFormatter, YamlFormatter};
pub use progress::ProgressObserver;

/// Re-export common types
pub use anyhow::{Context, Result};
