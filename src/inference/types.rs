//! Wire types for a llama.cpp-compatible completion server.

use serde::{Deserialize, Serialize};

/// Body of `POST /completion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub n_predict: u32,
    /// `0.0` selects greedy sampling.
    pub temperature: f32,
    pub repeat_penalty: f32,
    /// Window of recent tokens the repetition penalty looks at.
    pub repeat_last_n: u32,
}

/// Response of `POST /completion`; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    #[serde(default)]
    pub stop: bool,
    #[serde(default)]
    pub tokens_predicted: u32,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
