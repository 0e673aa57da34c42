use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use super::error::InferenceError;
use super::types::{CompletionRequest, CompletionResponse, HealthResponse};
use super::{Engine, Inference};

const REPEAT_PENALTY: f32 = 1.1;
const REPEAT_LAST_N: u32 = 64;

#[derive(Debug, Clone)]
pub struct LlamaOptions {
    /// Base URL of the completion server, without a trailing path.
    pub endpoint: String,
    pub n_predict: u32,
    pub request_timeout: Duration,
}

// Read-only model description shared by every runner.
#[derive(Debug)]
struct LlamaModel {
    endpoint: String,
    n_predict: u32,
    request_timeout: Duration,
}

/// Engine backed by a llama.cpp-compatible HTTP server.
#[derive(Debug, Clone)]
pub struct LlamaEngine {
    model: Arc<LlamaModel>,
}

impl LlamaEngine {
    /// Probes `GET /health` once and fails if the model is not ready.
    pub async fn connect(options: LlamaOptions) -> Result<Self, InferenceError> {
        let endpoint = options.endpoint.trim_end_matches('/').to_string();
        let unavailable = |reason: String| InferenceError::Unavailable {
            endpoint: endpoint.clone(),
            reason,
        };

        let client = build_client(Duration::from_secs(10))?;
        let response = client
            .get(format!("{endpoint}/health"))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("health check returned {status}")));
        }
        let health = response
            .json::<HealthResponse>()
            .await
            .map_err(|e| unavailable(format!("malformed health response: {e}")))?;
        if health.status != "ok" {
            return Err(unavailable(format!("server status is {:?}", health.status)));
        }

        info!(%endpoint, "Model is ready");
        Ok(Self {
            model: Arc::new(LlamaModel {
                endpoint,
                n_predict: options.n_predict,
                request_timeout: options.request_timeout,
            }),
        })
    }
}

impl Engine for LlamaEngine {
    type Runner = LlamaRunner;

    fn runner(&self) -> Result<LlamaRunner, InferenceError> {
        Ok(LlamaRunner {
            client: build_client(self.model.request_timeout)?,
            model: Arc::clone(&self.model),
        })
    }
}

/// One worker's handle: its own HTTP client over the shared model.
pub struct LlamaRunner {
    model: Arc<LlamaModel>,
    client: Client,
}

impl Inference for LlamaRunner {
    async fn infer(&self, content: &str) -> Result<String, InferenceError> {
        let req = CompletionRequest {
            prompt: format_prompt(content),
            n_predict: self.model.n_predict,
            temperature: 0.0,
            repeat_penalty: REPEAT_PENALTY,
            repeat_last_n: REPEAT_LAST_N,
        };

        let response = self
            .client
            .post(format!("{}/completion", self.model.endpoint))
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<CompletionResponse>().await?;
        debug!(tokens = body.tokens_predicted, "Completion received");
        if body.content.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }
        Ok(body.content)
    }
}

fn build_client(timeout: Duration) -> Result<Client, InferenceError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()?)
}

/// Chat-style prompt template the bundled models are tuned for.
pub fn format_prompt(content: &str) -> String {
    format!("<|user|>\n{content}\n<|assistant|>\n")
}
