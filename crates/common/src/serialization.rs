//! Serialization utilities.
//!
//! Exams and run records are stored as YAML or JSON documents; the format is
//! chosen from the file extension.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a path extension; `None` for anything else
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Read a YAML or JSON document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DocumentFormat::from_path(path)
        .with_context(|| format!("Unsupported document extension: {}", path.display()))?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    match format {
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML document {}", path.display())),
        DocumentFormat::Json => serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON document {}", path.display())),
    }
}

/// Write a document, creating parent directories; unknown extensions get YAML
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Yaml) {
        DocumentFormat::Yaml => serde_yaml::to_writer(&mut writer, value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?,
        DocumentFormat::Json => serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?,
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))
}
