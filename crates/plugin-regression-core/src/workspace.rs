//! Workspace layout for comparison runs.
//!
//! Layout: `<root>/<task>/<test label>/<cohort>/`
//!
//! Every call to [`RootWorkspace::current_task`] yields a fresh task directory
//! named after the UTC start time plus a random suffix, so two comparisons
//! never share a directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::cohort::Cohort;

/// Name of the manifest written into each test workspace.
pub const MANIFEST_FILE: &str = "comparison.json";

/// Top-level output directory shared by all runs.
#[derive(Debug, Clone)]
pub struct RootWorkspace {
    root: PathBuf,
}

impl RootWorkspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named task directory.
    pub fn current_task(&self) -> std::io::Result<TaskWorkspace> {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let dir = self.root.join(format!("{stamp}-{}", &suffix[..8]));
        fs::create_dir_all(&dir)?;
        Ok(TaskWorkspace { dir })
    }
}

/// One invocation of the harness.
#[derive(Debug, Clone)]
pub struct TaskWorkspace {
    dir: PathBuf,
}

impl TaskWorkspace {
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Create the directory for one labelled test inside this task.
    pub fn isolate_test(&self, label: &str) -> std::io::Result<TestWorkspace> {
        let dir = self.dir.join(path_component(label));
        fs::create_dir_all(&dir)?;
        Ok(TestWorkspace { dir })
    }
}

/// Handle passed to every performance test unit of one comparison.
#[derive(Debug, Clone)]
pub struct TestWorkspace {
    dir: PathBuf,
}

impl TestWorkspace {
    /// Wrap an existing directory, creating it if needed.
    pub fn at(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Results directory owned by `cohort`. Distinct cohorts never share one.
    pub fn cohort_directory(&self, cohort: &Cohort) -> PathBuf {
        self.dir.join(path_component(cohort.as_str()))
    }

    /// Create the results directory owned by `cohort`.
    pub async fn isolate_cohort(&self, cohort: &Cohort) -> std::io::Result<PathBuf> {
        let dir = self.cohort_directory(cohort);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Atomically write `value` as pretty JSON to [`MANIFEST_FILE`].
    pub fn write_manifest<T: Serialize>(&self, value: &T) -> crate::Result<PathBuf> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = serde_json::to_vec_pretty(value)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(path)
    }
}

/// Map a label onto a single safe path component.
///
/// Bytes outside `[A-Za-z0-9._]` are percent-encoded, so the mapping is
/// injective: `7.2.0*` and `7.2.0-star` land in different directories.
fn path_component(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for b in label.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    match out.as_str() {
        // A lone `%` is never produced by the encoding above.
        "" => "%".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => out,
    }
}
