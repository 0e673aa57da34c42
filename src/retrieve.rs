//! Read-only access to completed results in `output/`.

use std::fs;

use tracing::debug;

use crate::job::{JobId, JobState};
use crate::workspace::Workspace;

/// A completed job's result as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub job_id: JobId,
    pub inference: String,
}

#[derive(Debug, Clone)]
pub struct Retriever {
    workspace: Workspace,
}

impl Retriever {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// The result of `job_id`, or `None` if there is no readable completed
    /// artifact for it. An empty result is still `Some`.
    pub fn retrieve(&self, job_id: &str) -> Option<Completed> {
        let id = JobId::parse(job_id)?;
        let path = self.workspace.content_path(JobState::Completed, &id);
        match fs::read_to_string(&path) {
            Ok(inference) => Some(Completed {
                job_id: id,
                inference,
            }),
            Err(e) => {
                debug!(job_id = %id, error = %e, "No completed result");
                None
            }
        }
    }

    /// The completed result with the greatest job ID, which for IDs from one
    /// process is the most recently submitted one.
    pub fn retrieve_latest(&self) -> Option<Completed> {
        let latest = match self.workspace.list(JobState::Completed) {
            Ok(ids) => ids.into_iter().max()?,
            Err(e) => {
                debug!(error = %e, "Cannot list completed results");
                return None;
            }
        };
        self.retrieve(latest.as_str())
    }
}
