//! Feature-extraction embedding client
//!
//! Posts `{"inputs": text}` to a Hugging Face style feature-extraction
//! endpoint. Sentence-embedding models answer with a vector; plain encoder
//! models answer with one vector per token, which is mean-pooled here.

use crate::{error_for_status, http_client, LlmError, RetryPolicy};
use argmap_domain::traits::Embedder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP embedding client
pub struct InferenceEmbedder {
    url: String,
    token: Option<String>,
    dimension: usize,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Vector(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
    Batch(Vec<Vec<Vec<f32>>>),
}

impl InferenceEmbedder {
    /// Create an embedder producing vectors of `dimension`
    pub fn new(url: impl Into<String>, dimension: usize) -> Self {
        Self {
            url: url.into(),
            token: None,
            dimension,
            client: http_client(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Authenticate with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn pool(response: EmbedResponse, dimension: usize) -> Result<Vec<f32>, LlmError> {
        let vector = match response {
            EmbedResponse::Vector(v) => v,
            EmbedResponse::Tokens(tokens) => mean_pool(&tokens),
            EmbedResponse::Batch(mut batch) => {
                if batch.len() != 1 {
                    return Err(LlmError::InvalidResponse(format!(
                        "expected one embedding, got {}",
                        batch.len()
                    )));
                }
                mean_pool(&batch.remove(0))
            }
        };
        if vector.len() != dimension {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} dimensions, got {}",
                dimension,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, v) in sum.iter_mut().zip(token) {
            *acc += v;
        }
    }
    let n = tokens.len() as f32;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

#[async_trait]
impl Embedder for InferenceEmbedder {
    type Error = LlmError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let body = EmbedRequest { inputs: text };
        let response = self
            .retry
            .run("embedding", || async {
                let mut request = self.client.post(&self.url).json(&body);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                let response = error_for_status(request.send().await?, &self.url).await?;
                Ok::<_, LlmError>(response.json::<EmbedResponse>().await?)
            })
            .await?;
        Self::pool(response, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
