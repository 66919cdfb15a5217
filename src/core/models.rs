use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::BackupTarget;

/// One target's in-flight backup. The job owns the local archive file and
/// removes it when dropped, however the job ends. Removal failures are logged
/// and swallowed; they never affect the run outcome.
#[derive(Debug)]
pub struct ArchiveJob {
    pub target: BackupTarget,
    archive_name: String,
    archive_path: PathBuf,
}

impl ArchiveJob {
    /// Creates the job for `target`, deriving the archive file name from the
    /// target name and the current local date: `{name}-{YYYY-MM-DD}.zip`.
    /// The archive lives in the process working directory.
    pub fn new(target: &BackupTarget) -> Self {
        let archive_name = format!("{}-{}.zip", target.name, Local::now().format("%Y-%m-%d"));
        Self::at(target, PathBuf::from(&archive_name))
    }

    /// Like [`ArchiveJob::new`] but with the archive anchored at an explicit
    /// path. Used by tests to keep archives inside a temporary directory.
    pub fn at(target: &BackupTarget, archive_path: PathBuf) -> Self {
        let archive_name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            target: target.clone(),
            archive_name,
            archive_path,
        }
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

impl Drop for ArchiveJob {
    fn drop(&mut self) {
        // Nothing to clean up if archive creation never got as far as the file.
        if !self.archive_path.exists() {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.archive_path) {
            warn!(archive = %self.archive_name, error = %err, "failed to remove local archive");
        }
    }
}

/// Aggregated result of one full pipeline run, consumed by the report builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Count of configured targets, including skipped (empty-path) ones.
    pub total_targets: usize,
    /// Source paths of targets whose archive or upload step failed, in
    /// processing order.
    pub failed_targets: Vec<String>,
}

impl RunOutcome {
    pub fn new(total_targets: usize) -> Self {
        Self {
            total_targets,
            failed_targets: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, path: impl Into<String>) {
        self.failed_targets.push(path.into());
    }

    pub fn failed(&self) -> usize {
        self.failed_targets.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_targets.is_empty()
    }
}
