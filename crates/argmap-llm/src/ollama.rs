//! Ollama Provider Implementation
//!
//! Talks to a local Ollama instance through `/api/generate`. Structured
//! calls switch on Ollama's JSON mode; every request goes through the
//! provider's [`RetryPolicy`].
//!
//! # Examples
//!
//! ```no_run
//! use argmap_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1");
//! ```

use crate::{error_for_status, http_client, LlmError, RetryPolicy};
use argmap_domain::traits::{GenerationParams, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for generation requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Create a provider for the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(
        &self,
        prompt: &str,
        params: GenerationParams,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: json_mode.then_some("json"),
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };

        self.retry
            .run("ollama generate", || async {
                let response = self.client.post(&url).json(&body).send().await?;
                let response = error_for_status(response, &self.model).await?;
                let parsed: GenerateResponse = response.json().await?;
                debug!("Ollama returned {} chars", parsed.response.len());
                Ok::<_, LlmError>(parsed.response)
            })
            .await
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, Self::Error> {
        self.request(prompt, params, false).await
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &str,
        params: GenerationParams,
    ) -> Result<String, Self::Error> {
        let prompt = format!("{}\n\nRespond with JSON matching this schema:\n{}", prompt, schema);
        self.request(&prompt, params, true).await
    }
}
