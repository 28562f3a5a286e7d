//! Exam discovery and loading.
//!
//! Integrity problems (dangling passage references, duplicate question
//! numbers, missing fields) are load-time errors; softer issues are logged
//! as warnings and the exam is still returned.

use crate::{ApplicationError, ApplicationResult};
use exam_bench_common::{read_document, DocumentFormat};
use exam_bench_domain::{ensure_exam_integrity, Exam};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load and validate one exam document
pub fn load_exam(path: &Path) -> ApplicationResult<Exam> {
    if !path.is_file() {
        return Err(ApplicationError::NotFound(format!(
            "Exam file {}",
            path.display()
        )));
    }

    let exam: Exam =
        read_document(path).map_err(|e| ApplicationError::Serialization(format!("{:#}", e)))?;

    let report = ensure_exam_integrity(&exam).map_err(|e| {
        ApplicationError::ValidationFailed(format!("{}: {}", path.display(), e))
    })?;
    for issue in &report.warnings {
        warn!(exam_id = %exam.exam_id, path = %issue.path, "{}", issue.message);
    }

    debug!(
        exam_id = %exam.exam_id,
        questions = exam.questions.len(),
        passages = exam.passages.len(),
        "Loaded exam"
    );
    Ok(exam)
}

/// Exam documents (`.yaml`, `.yml`, `.json`) directly under `dir`, sorted by path
pub fn discover_exams(dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ApplicationError::NotFound(format!(
            "Exams directory {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && DocumentFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
