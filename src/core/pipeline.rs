//! The per-run backup pipeline.
//!
//! One run walks the configured targets in order, strictly sequentially:
//! archive the directory, upload the archive, record the outcome. A failing
//! target never aborts the batch; its source path is recorded and the run
//! moves on. Each job's local archive is removed when the job's scope ends,
//! whichever way it ends, so local disk usage is bounded to one archive at
//! a time.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info};

use super::archiver;
use super::models::{ArchiveJob, RunOutcome};
use super::report;
use super::storage::{self, ObjectStore};
use crate::context::AppContext;

pub struct Pipeline {
    ctx: AppContext,
}

impl Pipeline {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// One full pass: acquire the store, process every target, report.
    ///
    /// Store construction failure is fatal to this run only: it is reported
    /// through the log and the notification channel, no target is attempted,
    /// and the next scheduled run starts from scratch.
    pub async fn run(&self) {
        let store = match storage::create_store(&self.ctx.config) {
            Ok(store) => store,
            Err(err) => {
                let text = format!("backup run aborted: {err}");
                error!("{text}");
                report::notify(&text, self.ctx.notifier.as_ref()).await;
                return;
            }
        };

        let outcome = self.process_targets(store.as_ref()).await;
        report::build_and_send(&outcome, self.ctx.notifier.as_ref()).await;
    }

    /// Processes every configured target against `store` and returns the
    /// aggregated outcome. Targets with an empty path are skipped and never
    /// counted as failures.
    pub async fn process_targets(&self, store: &dyn ObjectStore) -> RunOutcome {
        let config = &self.ctx.config;
        let mut outcome = RunOutcome::new(config.backups.len());

        for target in &config.backups {
            if target.path.is_empty() {
                info!(name = %target.name, "skipping target with no path");
                continue;
            }

            let job = ArchiveJob::new(target);
            if let Err(err) = self.run_job(&job, store).await {
                error!(name = %target.name, "backup failed: {err:#}");
                outcome.record_failure(&target.path);
            }
            // `job` drops here and takes its archive file with it.
        }

        outcome
    }

    async fn run_job(&self, job: &ArchiveJob, store: &dyn ObjectStore) -> Result<()> {
        archiver::archive(Path::new(&job.target.path), job.archive_path())
            .await
            .with_context(|| format!("failed to archive {}", job.target.path))?;

        let key = format!("{}/{}", self.ctx.config.oss.remote_dir, job.archive_name());
        store.put(&key, job.archive_path()).await?;

        info!(name = %job.target.name, key, "backup uploaded");
        Ok(())
    }
}
