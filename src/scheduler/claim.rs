use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::dispatch::DispatchQueue;
use crate::error::Result;
use crate::job::{JobId, JobState};
use crate::workspace::Workspace;

/// Moves a queued job into `processing/`. `false` means another mover got
/// there first, which is expected and not an error.
pub(crate) fn try_claim(workspace: &Workspace, id: &JobId) -> bool {
    match workspace.transfer(id, JobState::Queued, JobState::Claimed) {
        Ok(()) => true,
        Err(e) => {
            debug!(job_id = %id, error = %e, "Job already claimed, skipping");
            false
        }
    }
}

/// One pass over `input/ready`, claiming in listing order.
pub(crate) fn claim_ready(workspace: &Workspace) -> Result<Vec<JobId>> {
    Ok(workspace
        .list(JobState::Queued)?
        .into_iter()
        .filter(|id| try_claim(workspace, id))
        .collect())
}

/// Hands a claimed job back to the queue so a later run picks it up.
pub(crate) fn release(workspace: &Workspace, id: &JobId) {
    match workspace.transfer(id, JobState::Claimed, JobState::Queued) {
        Ok(()) => debug!(job_id = %id, "Released claimed job"),
        Err(e) => warn!(job_id = %id, error = %e, "Failed to release claimed job"),
    }
}

/// Releases everything a previous process left in `processing/`.
pub(crate) fn recover_claimed(workspace: &Workspace) -> Result<usize> {
    let orphans = workspace.list(JobState::Claimed)?;
    for id in &orphans {
        release(workspace, id);
    }
    if !orphans.is_empty() {
        info!(count = orphans.len(), "Recovered jobs left in processing");
    }
    Ok(orphans.len())
}

/// Scans `input/ready` every `interval` until shutdown is signalled.
pub(crate) async fn claim_loop(
    workspace: Workspace,
    queue: Arc<DispatchQueue>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(dir = %workspace.dir(JobState::Queued).display(), "Watching for queued jobs");

    while !*shutdown.borrow() {
        let scan = tokio::task::spawn_blocking({
            let workspace = workspace.clone();
            move || claim_ready(&workspace)
        })
        .await;

        match scan {
            Ok(Ok(claimed)) => {
                for id in claimed {
                    debug!(job_id = %id, "Job queued for processing");
                    if let Err(id) = queue.push(id) {
                        release(&workspace, &id);
                    }
                }
            }
            Ok(Err(e)) => error!(error = %e, "Directory scan error"),
            Err(e) => error!(error = %e, "Directory scan task panicked"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Claiming loop stopped");
}
