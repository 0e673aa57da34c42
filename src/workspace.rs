//! On-disk layout of a queue workspace and the atomic move primitive.
//!
//! Every job transition is a `rename(2)` of the job's content file between
//! two directories of the same workspace. A rename of one source path
//! succeeds for exactly one caller; every concurrent mover gets `NotFound`.
//! That is the only mutual exclusion the queue relies on, so all five
//! directories must live on the same filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{NrvnaError, Result};
use crate::job::{JobId, JobState, Metadata};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, state: JobState) -> PathBuf {
        self.root.join(state.dir())
    }

    pub fn content_path(&self, state: JobState, id: &JobId) -> PathBuf {
        self.dir(state).join(id.content_file())
    }

    pub fn meta_path(&self, state: JobState, id: &JobId) -> PathBuf {
        self.dir(state).join(id.meta_file())
    }

    /// Creates every queue directory. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        self.ensure_dirs(&JobState::ALL)
    }

    /// Creates only the directories the submitter writes to.
    pub fn ensure_input(&self) -> Result<()> {
        self.ensure_dirs(&[JobState::Staging, JobState::Queued])
    }

    fn ensure_dirs(&self, states: &[JobState]) -> Result<()> {
        for state in states {
            let dir = self.dir(*state);
            fs::create_dir_all(&dir).map_err(|e| NrvnaError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Atomically moves a job's content file from `from` to `to`, then
    /// carries the sidecar along best-effort.
    ///
    /// Fails only if the lifecycle forbids the edge or the content rename
    /// itself failed; a lost sidecar is logged and tolerated.
    pub fn transfer(&self, id: &JobId, from: JobState, to: JobState) -> Result<()> {
        self.move_content(id, from, to)?;

        match fs::rename(self.meta_path(from, id), self.meta_path(to, id)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(job_id = %id, %from, %to, error = %e, "Failed to move sidecar, metadata dropped");
            }
        }
        Ok(())
    }

    /// Renames only the content file; the sidecar stays where it is.
    pub fn move_content(&self, id: &JobId, from: JobState, to: JobState) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(NrvnaError::InvalidTransition { from, to });
        }
        let src = self.content_path(from, id);
        fs::rename(&src, self.content_path(to, id)).map_err(|e| NrvnaError::io(&src, e))
    }

    /// Job IDs of the `*.txt` files in `state`'s directory, in listing order.
    pub fn list(&self, state: JobState) -> Result<Vec<JobId>> {
        let dir = self.dir(state);
        let entries = fs::read_dir(&dir).map_err(|e| NrvnaError::io(&dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NrvnaError::io(&dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let path = entry.path();
            if !is_file || path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(JobId::parse)
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Sidecar of a job in `state`; missing or unreadable means no metadata.
    pub fn read_metadata(&self, state: JobState, id: &JobId) -> Metadata {
        match fs::read_to_string(self.meta_path(state, id)) {
            Ok(text) => Metadata::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Metadata::default(),
            Err(e) => {
                warn!(job_id = %id, error = %e, "Unreadable sidecar, ignoring");
                Metadata::default()
            }
        }
    }

    /// Best-effort removal of a job's content and sidecar from `state`.
    pub fn discard(&self, state: JobState, id: &JobId) {
        remove_quietly(&self.content_path(state, id));
        remove_quietly(&self.meta_path(state, id));
    }
}

/// Cleanup on failure paths never propagates.
pub(crate) fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "Cleanup failed"),
    }
}
