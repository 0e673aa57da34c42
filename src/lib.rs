//! nrvna: a filesystem-backed job queue for local inference.
//!
//! Jobs are plain files moved between the directories of a [`Workspace`]:
//! a [`Submitter`] publishes them into `input/ready`, a [`Scheduler`] claims
//! them into `processing` and hands them to a pool of workers, and a
//! [`Retriever`] reads finished results out of `output`.

pub mod config;
pub mod error;
pub mod inference;
pub mod job;
pub mod notify;
pub mod retrieve;
pub mod scheduler;
pub mod submit;
pub mod workspace;

pub use config::NrvnaConfig;
pub use error::{FailureKind, NrvnaError, Result};
pub use inference::{Engine, Inference, InferenceError, LlamaEngine};
pub use job::{Job, JobId, JobState};
pub use notify::{MailNotifier, NoopNotifier, Notifier};
pub use retrieve::{Completed, Retriever};
pub use scheduler::{JobOutcome, Scheduler};
pub use submit::Submitter;
pub use workspace::Workspace;
