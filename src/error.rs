use std::path::PathBuf;

use thiserror::Error;

use crate::inference::InferenceError;
use crate::notify::NotifyError;

pub type Result<T, E = NrvnaError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum NrvnaError {
    #[error("Job content must not be empty")]
    EmptyContent,

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::job::JobState,
        to: crate::job::JobState,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Scheduler was stopped and cannot be reused")]
    Stopped,

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NrvnaError {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NrvnaError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a claimed job ended up in `failed/` instead of `output/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The claimed content file could not be read.
    Read(String),
    /// The inference runner returned an error.
    Inference(String),
    /// The runner succeeded but produced no text.
    EmptyResult,
    /// The result could not be written to `output/`.
    Write(String),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Read(msg) => write!(f, "read failure: {msg}"),
            FailureKind::Inference(msg) => write!(f, "inference failure: {msg}"),
            FailureKind::EmptyResult => write!(f, "empty inference result"),
            FailureKind::Write(msg) => write!(f, "write failure: {msg}"),
        }
    }
}
