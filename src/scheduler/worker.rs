use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::dispatch::DispatchQueue;
use crate::error::FailureKind;
use crate::inference::Inference;
use crate::job::{Job, JobId, JobState};
use crate::notify::Notifier;
use crate::workspace::{Workspace, remove_quietly};

/// How a claimed job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(FailureKind),
}

/// Pulls claimed jobs off the dispatch queue until shutdown. The worker owns
/// its runner, so it runs at most one job at a time.
pub(crate) async fn worker_loop<R: Inference, N: Notifier>(
    worker: usize,
    runner: R,
    workspace: Workspace,
    queue: Arc<DispatchQueue>,
    notifier: Arc<N>,
) {
    debug!(worker, "Worker started");
    while let Some(id) = queue.pop().await {
        debug!(worker, job_id = %id, "Processing job");
        execute(&workspace, &runner, notifier.as_ref(), &id).await;
    }
    debug!(worker, "Worker stopped");
}

/// Runs one claimed job to a terminal state.
///
/// Success: result lands in `output/`, claimed files are removed, then the
/// notification target (if any) is told. Failure: content moves to
/// `failed/`, or is deleted if even that move fails; the sidecar is dropped.
pub(crate) async fn execute<R: Inference, N: Notifier>(
    workspace: &Workspace,
    runner: &R,
    notifier: &N,
    id: &JobId,
) -> JobOutcome {
    let mut job = match load_claimed(workspace, id).await {
        Ok(job) => job,
        Err(kind) => return fail(workspace, id, kind).await,
    };

    let result = match produce(workspace, runner, &job).await {
        Ok(result) => result,
        Err(kind) => return fail(workspace, id, kind).await,
    };

    off_runtime(workspace, id, |ws, id| ws.discard(JobState::Claimed, id)).await;
    if let Err(e) = job.advance(JobState::Completed) {
        warn!(job_id = %id, error = %e, "Unexpected lifecycle state");
    }
    info!(job_id = %id, "Job completed");

    if let Some(target) = job.notify_target() {
        match notifier.notify(target, id, &result).await {
            Ok(()) => info!(job_id = %id, %target, "Notified result"),
            Err(e) => error!(job_id = %id, %target, error = %e, "Notification failed"),
        }
    }
    JobOutcome::Completed
}

async fn load_claimed(workspace: &Workspace, id: &JobId) -> Result<Job, FailureKind> {
    let content = tokio::fs::read_to_string(workspace.content_path(JobState::Claimed, id))
        .await
        .map_err(|e| FailureKind::Read(e.to_string()))?;
    Ok(Job {
        id: id.clone(),
        content,
        metadata: off_runtime(workspace, id, |ws, id| ws.read_metadata(JobState::Claimed, id))
            .await
            .unwrap_or_default(),
        state: JobState::Claimed,
    })
}

// Writes next to the claimed file first so readers of `output/` never see a
// partial result.
async fn produce<R: Inference>(
    workspace: &Workspace,
    runner: &R,
    job: &Job,
) -> Result<String, FailureKind> {
    let result = runner
        .infer(&job.content)
        .await
        .map_err(|e| FailureKind::Inference(e.to_string()))?;
    if result.is_empty() {
        return Err(FailureKind::EmptyResult);
    }

    let partial = workspace
        .dir(JobState::Claimed)
        .join(format!("{}.result", job.id));
    let write = async {
        tokio::fs::write(&partial, &result).await?;
        tokio::fs::rename(&partial, workspace.content_path(JobState::Completed, &job.id)).await
    };
    if let Err(e) = write.await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!(path = %partial.display(), error = %cleanup, "Cleanup failed");
        }
        return Err(FailureKind::Write(e.to_string()));
    }
    Ok(result)
}

async fn fail(workspace: &Workspace, id: &JobId, kind: FailureKind) -> JobOutcome {
    error!(job_id = %id, reason = %kind, "Job failed");

    off_runtime(workspace, id, |ws, id| {
        if let Err(e) = ws.move_content(id, JobState::Claimed, JobState::Failed) {
            warn!(job_id = %id, error = %e, "Could not move job to failed, deleting it");
            remove_quietly(&ws.content_path(JobState::Claimed, id));
        }
        remove_quietly(&ws.meta_path(JobState::Claimed, id));
    })
    .await;
    JobOutcome::Failed(kind)
}

/// Runs blocking workspace bookkeeping on the blocking pool. `None` means
/// the closure panicked.
async fn off_runtime<T, F>(workspace: &Workspace, id: &JobId, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&Workspace, &JobId) -> T + Send + 'static,
{
    let (workspace, id) = (workspace.clone(), id.clone());
    let job_id = id.clone();
    match tokio::task::spawn_blocking(move || f(&workspace, &id)).await {
        Ok(value) => Some(value),
        Err(e) => {
            error!(%job_id, error = %e, "Workspace task panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{MockEngine, RecordingNotifier};
    use crate::inference::Engine;
    use crate::submit::Submitter;
    use crate::scheduler::claim::try_claim;
    use std::fs;
    use tempfile::TempDir;

    fn claimed_job(content: &str, notify: Option<&str>) -> (TempDir, Workspace, JobId) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        ws.ensure().unwrap();
        let id = Submitter::new(ws.clone()).unwrap().submit(content, notify).unwrap();
        assert!(try_claim(&ws, &id));
        (tmp, ws, id)
    }

    fn dir_len(ws: &Workspace, state: JobState) -> usize {
        fs::read_dir(ws.dir(state)).unwrap().count()
    }

    #[tokio::test]
    async fn success_writes_output_and_clears_processing() {
        let (_tmp, ws, id) = claimed_job("hello", None);
        let runner = MockEngine::default().runner().unwrap();
        let notifier = RecordingNotifier::default();

        let outcome = execute(&ws, &runner, &notifier, &id).await;

        assert_eq!(outcome, JobOutcome::Completed);
        assert_eq!(
            fs::read_to_string(ws.content_path(JobState::Completed, &id)).unwrap(),
            "echo: hello"
        );
        assert_eq!(dir_len(&ws, JobState::Claimed), 0);
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn success_notifies_target_with_result() {
        let (_tmp, ws, id) = claimed_job("hello", Some("me@example.com"));
        let runner = MockEngine::default().runner().unwrap();
        let notifier = RecordingNotifier::default();

        execute(&ws, &runner, &notifier, &id).await;

        assert_eq!(
            notifier.calls(),
            vec![("me@example.com".to_string(), id.to_string(), "echo: hello".to_string())]
        );
        assert!(!ws.meta_path(JobState::Claimed, &id).exists());
    }

    #[tokio::test]
    async fn notification_failure_keeps_job_completed() {
        let (_tmp, ws, id) = claimed_job("hello", Some("me@example.com"));
        let runner = MockEngine::default().runner().unwrap();
        let notifier = RecordingNotifier::failing();

        let outcome = execute(&ws, &runner, &notifier, &id).await;

        assert_eq!(outcome, JobOutcome::Completed);
        assert!(ws.content_path(JobState::Completed, &id).exists());
    }

    #[tokio::test]
    async fn inference_failure_moves_job_to_failed() {
        let (_tmp, ws, id) = claimed_job("boom", Some("me@example.com"));
        let runner = MockEngine::failing_on("boom").runner().unwrap();
        let notifier = RecordingNotifier::default();

        let outcome = execute(&ws, &runner, &notifier, &id).await;

        assert!(matches!(outcome, JobOutcome::Failed(FailureKind::Inference(_))));
        assert_eq!(
            fs::read_to_string(ws.content_path(JobState::Failed, &id)).unwrap(),
            "boom"
        );
        assert!(!ws.content_path(JobState::Completed, &id).exists());
        assert!(!ws.meta_path(JobState::Failed, &id).exists());
        assert_eq!(dir_len(&ws, JobState::Claimed), 0);
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_result_is_a_failure() {
        let (_tmp, ws, id) = claimed_job("silent", None);
        let runner = MockEngine::default().runner().unwrap();

        let outcome = execute(&ws, &runner, &RecordingNotifier::default(), &id).await;

        assert_eq!(outcome, JobOutcome::Failed(FailureKind::EmptyResult));
        assert!(ws.content_path(JobState::Failed, &id).exists());
    }

    #[tokio::test]
    async fn missing_claimed_file_is_a_read_failure() {
        let (_tmp, ws, id) = claimed_job("hello", None);
        fs::remove_file(ws.content_path(JobState::Claimed, &id)).unwrap();
        let runner = MockEngine::default().runner().unwrap();

        let outcome = execute(&ws, &runner, &RecordingNotifier::default(), &id).await;

        assert!(matches!(outcome, JobOutcome::Failed(FailureKind::Read(_))));
        assert_eq!(dir_len(&ws, JobState::Failed), 0);
    }

    #[tokio::test]
    async fn unwritable_output_is_a_write_failure() {
        let (_tmp, ws, id) = claimed_job("hello", None);
        fs::remove_dir(ws.dir(JobState::Completed)).unwrap();
        let runner = MockEngine::default().runner().unwrap();

        let outcome = execute(&ws, &runner, &RecordingNotifier::default(), &id).await;

        assert!(matches!(outcome, JobOutcome::Failed(FailureKind::Write(_))));
        assert!(ws.content_path(JobState::Failed, &id).exists());
        assert_eq!(dir_len(&ws, JobState::Claimed), 0);
    }

    #[tokio::test]
    async fn failed_move_falls_back_to_deletion() {
        let (_tmp, ws, id) = claimed_job("boom", None);
        fs::remove_dir(ws.dir(JobState::Failed)).unwrap();
        let runner = MockEngine::failing_on("boom").runner().unwrap();

        let outcome = execute(&ws, &runner, &RecordingNotifier::default(), &id).await;

        assert!(matches!(outcome, JobOutcome::Failed(_)));
        assert_eq!(dir_len(&ws, JobState::Claimed), 0);
    }
}
