//! Job submission: stage, then publish with a single atomic rename.
//!
//! This is the ingestion entry point every front door goes through.

use std::fs;

use tracing::info;

use crate::error::{NrvnaError, Result};
use crate::job::{Job, JobId, JobState};
use crate::workspace::{Workspace, remove_quietly};

#[derive(Debug, Clone)]
pub struct Submitter {
    workspace: Workspace,
}

impl Submitter {
    /// Makes sure `input/writing` and `input/ready` exist.
    pub fn new(workspace: Workspace) -> Result<Self> {
        workspace.ensure_input()?;
        Ok(Self { workspace })
    }

    /// Publishes `content` as a new queued job and returns its ID.
    ///
    /// The sidecar is published before the content file, and the scheduler
    /// only looks at content files, so the job becomes visible in one step.
    /// On any failure every file this call created is removed.
    pub fn submit(&self, content: &str, notify: Option<&str>) -> Result<JobId> {
        if content.is_empty() {
            return Err(NrvnaError::EmptyContent);
        }

        let notify = notify.filter(|target| !target.is_empty()).map(str::to_string);
        let mut job = Job::new(content, notify);

        self.stage(&job).inspect_err(|_| self.workspace.discard(JobState::Staging, &job.id))?;
        self.publish(&job.id)?;
        job.advance(JobState::Queued)?;

        info!(job_id = %job.id, notify = job.notify_target().is_some(), "Job submitted");
        Ok(job.id)
    }

    fn stage(&self, job: &Job) -> Result<()> {
        let content_path = self.workspace.content_path(JobState::Staging, &job.id);
        fs::write(&content_path, &job.content).map_err(|e| NrvnaError::io(&content_path, e))?;

        if !job.metadata.is_empty() {
            let meta_path = self.workspace.meta_path(JobState::Staging, &job.id);
            fs::write(&meta_path, job.metadata.render()).map_err(|e| NrvnaError::io(&meta_path, e))?;
        }
        Ok(())
    }

    fn publish(&self, id: &JobId) -> Result<()> {
        let ws = &self.workspace;
        let staged_meta = ws.meta_path(JobState::Staging, id);
        let ready_meta = ws.meta_path(JobState::Queued, id);

        let rollback = |e: std::io::Error, path: &std::path::Path| {
            ws.discard(JobState::Staging, id);
            remove_quietly(&ready_meta);
            NrvnaError::io(path, e)
        };

        if staged_meta.exists() {
            fs::rename(&staged_meta, &ready_meta).map_err(|e| rollback(e, &staged_meta))?;
        }

        let staged = ws.content_path(JobState::Staging, id);
        fs::rename(&staged, ws.content_path(JobState::Queued, id))
            .map_err(|e| rollback(e, &staged))?;
        Ok(())
    }
}
