//! The compute step that turns job content into a result.
//!
//! An [`Engine`] is the shared, read-only model resource, built once at
//! startup. Each worker asks it for its own [`Inference`] runner so workers
//! never contend on a single handle.

pub mod error;
pub mod llama;
pub mod types;

use std::future::Future;

pub use error::InferenceError;
pub use llama::{LlamaEngine, LlamaOptions, LlamaRunner};

/// A per-worker handle that runs one inference call at a time.
pub trait Inference: Send + Sync + 'static {
    fn infer(&self, content: &str) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

/// Shared model resource runners are built from.
pub trait Engine: Send + Sync + 'static {
    type Runner: Inference;

    /// Builds an independent runner. Failure here is fatal at startup.
    fn runner(&self) -> Result<Self::Runner, InferenceError>;
}
