//! Error types for inference engines and runners.

use thiserror::Error;

/// Errors raised while building runners or running inference.
///
/// - [`Unavailable`](InferenceError::Unavailable): the model could not be
///   reached or is not ready; fatal at startup.
/// - [`Api`](InferenceError::Api): the server answered with a non-success status.
/// - [`EmptyOutput`](InferenceError::EmptyOutput): the call succeeded with no text.
/// - [`Network`](InferenceError::Network): transport failure.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model unavailable at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("empty completion")]
    EmptyOutput,

    #[error("inference rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
