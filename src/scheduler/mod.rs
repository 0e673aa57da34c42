//! The job scheduler: one claiming loop feeding a fixed pool of workers.
//!
//! # Lifecycle
//!
//! 1. [`Scheduler::start`] prepares the workspace and builds one runner per
//!    worker from the shared engine. Failure here is fatal.
//! 2. [`Scheduler::run`] spawns the claiming loop and the workers, or
//!    [`Scheduler::process_once`] handles the current queue inline instead.
//!    Only `run` may recover jobs stranded in `processing/`, and only when
//!    `recover_claimed` is set: recovery cannot tell a crashed owner from a
//!    live one, so it is for a workspace served by a single scheduler.
//! 3. [`Scheduler::stop`] lets every worker finish its current job, waits
//!    for all tasks, and releases claimed jobs no worker picked up.
//!
//! Exactly-once hand-off between concurrent claimers comes from the rename
//! in [`Workspace::transfer`]; nothing else here takes a cross-process lock.

mod claim;
mod dispatch;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use dispatch::DispatchQueue;
pub use worker::JobOutcome;

use crate::config::NrvnaConfig;
use crate::error::{NrvnaError, Result};
use crate::inference::{Engine, Inference};
use crate::job::JobState;
use crate::notify::Notifier;
use crate::workspace::Workspace;

pub struct Scheduler<R: Inference, N: Notifier> {
    workspace: Workspace,
    scan_interval: Duration,
    runners: Vec<R>,
    notifier: Arc<N>,
    queue: Arc<DispatchQueue>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    recover_claimed: bool,
    stopped: bool,
}

impl<R: Inference, N: Notifier> Scheduler<R, N> {
    /// Creates the queue directories and one runner per configured worker.
    pub fn start<E>(workspace: Workspace, config: &NrvnaConfig, engine: &E, notifier: N) -> Result<Self>
    where
        E: Engine<Runner = R>,
    {
        config.validate()?;
        workspace.ensure()?;

        let runners = (0..config.workers)
            .map(|_| engine.runner())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        info!(workers = runners.len(), root = %workspace.root().display(), "Scheduler started");
        Ok(Self {
            workspace,
            scan_interval: config.scan_interval(),
            runners,
            notifier: Arc::new(notifier),
            queue: Arc::new(DispatchQueue::new()),
            shutdown: watch::channel(false).0,
            tasks: Vec::new(),
            recover_claimed: config.recover_claimed,
            stopped: false,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawns the claiming loop and the workers on the current runtime.
    pub fn run(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(NrvnaError::AlreadyRunning);
        }
        if self.stopped || self.runners.is_empty() {
            return Err(NrvnaError::Stopped);
        }
        if self.recover_claimed {
            claim::recover_claimed(&self.workspace)?;
        }

        self.tasks.push(tokio::spawn(claim::claim_loop(
            self.workspace.clone(),
            Arc::clone(&self.queue),
            self.scan_interval,
            self.shutdown.subscribe(),
        )));

        for (worker, runner) in self.runners.drain(..).enumerate() {
            self.tasks.push(tokio::spawn(worker::worker_loop(
                worker,
                runner,
                self.workspace.clone(),
                Arc::clone(&self.queue),
                Arc::clone(&self.notifier),
            )));
        }

        info!(workers = self.tasks.len() - 1, "Started continuous monitoring");
        Ok(())
    }

    /// Signals shutdown and waits until the claiming loop and every worker
    /// have exited. In-flight jobs run to completion first.
    pub async fn stop(&mut self) {
        self.signal_shutdown();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "Scheduler task panicked");
            }
        }

        for id in self.queue.drain() {
            claim::release(&self.workspace, &id);
        }
        self.runners.clear();
        self.stopped = true;
        info!("Scheduler stopped");
    }

    /// Claims and executes every job currently queued, one after another on
    /// the calling task. Returns how many completed. Jobs already in
    /// `processing/` belong to someone else and are left alone.
    pub async fn process_once(&self) -> Result<usize> {
        if self.is_running() {
            return Err(NrvnaError::AlreadyRunning);
        }
        let runner = self.runners.first().ok_or(NrvnaError::Stopped)?;

        let mut processed = 0;
        for id in self.workspace.list(JobState::Queued)? {
            if !claim::try_claim(&self.workspace, &id) {
                continue;
            }
            let outcome = worker::execute(&self.workspace, runner, self.notifier.as_ref(), &id).await;
            if outcome == JobOutcome::Completed {
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Runs until `shutdown` resolves, then stops gracefully.
    pub async fn serve(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.run()?;
        shutdown.await;
        info!("Shutdown requested, draining workers");
        self.stop().await;
        Ok(())
    }

    fn signal_shutdown(&self) {
        self.shutdown.send_replace(true);
        self.queue.shutdown();
    }
}

impl<R: Inference, N: Notifier> Drop for Scheduler<R, N> {
    // Background tasks cannot be awaited here; they are only told to exit.
    fn drop(&mut self) {
        if self.is_running() {
            self.signal_shutdown();
        }
    }
}
