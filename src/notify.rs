//! Best-effort delivery of finished results to a job's notification target.

use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::job::JobId;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notification target: {0:?}")]
    InvalidTarget(String),

    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        target: &str,
        job_id: &JobId,
        result: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Used when notifications are switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    async fn notify(&self, _target: &str, _job_id: &JobId, _result: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Pipes the result into `<command> -s <subject> <target>`, the calling
/// convention of the Unix `mail` utility.
#[derive(Debug, Clone)]
pub struct MailNotifier {
    command: String,
}

impl MailNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for MailNotifier {
    fn default() -> Self {
        Self::new("mail")
    }
}

impl Notifier for MailNotifier {
    async fn notify(&self, target: &str, job_id: &JobId, result: &str) -> Result<(), NotifyError> {
        // A leading dash would be parsed as an option by the mailer.
        if target.is_empty() || target.starts_with('-') || target.contains(char::is_whitespace) {
            return Err(NotifyError::InvalidTarget(target.to_string()));
        }

        let mut child = Command::new(&self.command)
            .arg("-s")
            .arg(format!("nrvna job {job_id} completed"))
            .arg(target)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| NotifyError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(result.as_bytes()).await {
                Ok(()) => {}
                // The mailer may exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(NotifyError::Failed {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
