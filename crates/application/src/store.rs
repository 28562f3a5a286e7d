//! Run persistence.
//!
//! Runs live at `{root}/{exam_id}/{model_name}.yaml`; `/` in model names
//! becomes `-`. Saving the same (exam, model) pair again overwrites the
//! previous record.

use crate::{ApplicationError, ApplicationResult};
use exam_bench_common::{read_document, write_document, DocumentFormat};
use exam_bench_domain::EvaluationRun;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-system store of evaluation runs
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default location of a run
    pub fn path_for(&self, exam_id: &str, model_name: &str) -> PathBuf {
        self.root
            .join(sanitize(exam_id))
            .join(format!("{}.yaml", sanitize(model_name)))
    }

    /// Save a run at its default location
    pub fn save(&self, run: &EvaluationRun) -> ApplicationResult<PathBuf> {
        let path = self.path_for(&run.exam_id, &run.model_name);
        self.save_to(&path, run)?;
        Ok(path)
    }

    /// Save a run at an explicit location
    pub fn save_to(&self, path: &Path, run: &EvaluationRun) -> ApplicationResult<()> {
        if path.exists() {
            debug!(path = %path.display(), "Overwriting previous run");
        }
        write_document(path, run).map_err(|e| ApplicationError::Io(format!("{:#}", e)))?;
        info!(
            path = %path.display(),
            exam_id = %run.exam_id,
            model = %run.model_name,
            "Saved evaluation run"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> ApplicationResult<EvaluationRun> {
        read_document(path).map_err(|e| ApplicationError::Serialization(format!("{:#}", e)))
    }

    /// Every run under the root, sorted by exam and model.
    ///
    /// Unreadable files are logged and skipped; a missing root yields no runs.
    pub fn load_all(&self) -> ApplicationResult<Vec<EvaluationRun>> {
        if !self.root.is_dir() {
            warn!(root = %self.root.display(), "Results directory does not exist");
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for exam_dir in std::fs::read_dir(&self.root)? {
            let exam_dir = exam_dir?.path();
            if !exam_dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&exam_dir)? {
                let path = entry?.path();
                if !path.is_file() || DocumentFormat::from_path(&path).is_none() {
                    continue;
                }
                match Self::load(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable run"),
                }
            }
        }

        runs.sort_by(|a, b| {
            a.exam_id
                .cmp(&b.exam_id)
                .then_with(|| a.model_name.cmp(&b.model_name))
        });
        debug!(runs = runs.len(), "Loaded stored runs");
        Ok(runs)
    }
}

fn sanitize(name: &str) -> String {
    name.replace(|c: char| c == '/' || c == '\\', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_bench_domain::{DispatchMode, Exam};

    fn exam(id: &str) -> Exam {
        Exam {
            exam_id: id.into(),
            title: "title".into(),
            subject: "math".into(),
            year: Some(2025),
            passages: vec![],
            questions: vec![],
        }
    }

    #[test]
    fn test_path_sanitizes_model_name() {
        let store = ResultStore::new("results");

        assert_eq!(
            store.path_for("2025-math", "meta/llama-3"),
            PathBuf::from("results/2025-math/meta-llama-3.yaml")
        );
    }

    #[test]
    fn test_save_load_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let first = EvaluationRun::new(&exam("e1"), "m", DispatchMode::Sequential, None, vec![]);
        let second = EvaluationRun::new(&exam("e1"), "m", DispatchMode::Sequential, None, vec![]);
        let path = store.save(&first).unwrap();
        assert_eq!(store.save(&second).unwrap(), path);

        let runs = store.load_all().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, second.run_id);
    }

    #[test]
    fn test_load_all_skips_garbage_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        for (exam_id, model) in [("e2", "a"), ("e1", "b"), ("e1", "a")] {
            let run =
                EvaluationRun::new(&exam(exam_id), model, DispatchMode::Sequential, None, vec![]);
            store.save(&run).unwrap();
        }
        std::fs::write(dir.path().join("e1").join("broken.yaml"), "not: [valid").unwrap();
        std::fs::write(dir.path().join("README.md"), "hi").unwrap();

        let keys: Vec<(String, String)> = store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| (r.exam_id, r.model_name))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("e1".to_string(), "a".to_string()),
                ("e1".to_string(), "b".to_string()),
                ("e2".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let store = ResultStore::new("/nonexistent/results");
        assert!(store.load_all().unwrap().is_empty());
    }
}
