//! LLM Client — the single point of entry for all generation calls in Sieve.
//!
//! ARCHITECTURAL RULE: No other module may talk to the model server directly.
//! All generation goes through [`gateway::Gateway`], which wraps a
//! [`TextGenerator`] transport with the retry policy.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod gateway;
pub mod prompts;

/// Sampling and output limits for one generation request.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop: Vec<String>,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.1,
            top_p: 0.3,
            stop: Vec::new(),
        }
    }
}

/// Generation failure taxonomy.
///
/// `is_retryable` splits these into transient failures (worth another
/// attempt) and terminal ones (the envelope can never become usable).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response envelope: {0}")]
    Envelope(String),

    #[error("response envelope missing field `{0}`")]
    MissingField(&'static str),

    #[error("model returned empty output")]
    EmptyOutput,

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    /// Transient failures: connection/transport trouble, server-side
    /// errors, a body that is not valid JSON, or an empty completion.
    /// A structurally impossible envelope (missing field, client-side
    /// rejection) is terminal and must not consume retry budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) | LlmError::Envelope(_) | LlmError::EmptyOutput => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::MissingField(_) | LlmError::RetriesExhausted { .. } => false,
        }
    }
}

/// Single-attempt text generation transport.
/// The retry loop lives in [`gateway::Gateway`], not here, so tests can
/// inject scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerateParams) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

/// HTTP client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.api_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            url: config.llm_url.clone(),
            model: config.llm_model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, params: &GenerateParams) -> Result<String, LlmError> {
        let request_body = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                num_predict: params.max_tokens,
                stop: &params.stop,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        // The envelope must be JSON with a string `response` field. A body
        // that is not JSON at all is a transient envelope error; JSON that
        // lacks the field can never become usable.
        let envelope: Value =
            serde_json::from_str(&body).map_err(|e| LlmError::Envelope(e.to_string()))?;

        let text = envelope
            .get("response")
            .and_then(Value::as_str)
            .ok_or(LlmError::MissingField("response"))?;

        debug!("generation returned {} chars", text.len());
        Ok(text.to_string())
    }
}
