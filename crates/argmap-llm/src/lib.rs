//! argmap external capability clients
//!
//! Implementations of the capability traits from `argmap-domain`:
//!
//! - Generation: [`OllamaProvider`], [`OpenAiProvider`], [`MockProvider`]
//! - Zero-shot classification: [`ZeroShotClassifier`], [`MockClassifier`]
//! - Embeddings: [`InferenceEmbedder`]
//!
//! plus the plumbing every remote call shares: [`RetryPolicy`] for transient
//! failures and [`json::parse_tolerant`] for slightly broken structured output.
//!
//! # Examples
//!
//! ```
//! use argmap_llm::MockProvider;
//! use argmap_domain::traits::{GenerationParams, LlmProvider};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from the model!");
//! let result = provider.generate("test prompt", GenerationParams::default()).await;
//! assert_eq!(result.unwrap(), "Hello from the model!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod classifier;
pub mod embedder;
pub mod json;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod retry;

use thiserror::Error;

pub use classifier::ZeroShotClassifier;
pub use embedder::InferenceEmbedder;
pub use mock::{MockClassifier, MockProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

/// Errors that can occur while talking to external models
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Server-side failure
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response envelope could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Structured output could not be parsed, even after repair
    #[error("Malformed structured output: {0}")]
    MalformedOutput(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::Timeout(_) | LlmError::RateLimitExceeded
        ) || matches!(self, LlmError::Server { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

/// Map a non-success HTTP response to an error
pub(crate) async fn error_for_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(LlmError::ModelNotAvailable(model.to_string()));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimitExceeded);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(LlmError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Build an HTTP client with a request timeout
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimitExceeded.is_transient());
        assert!(LlmError::Timeout("slow".into()).is_transient());
        assert!(LlmError::Communication("refused".into()).is_transient());
        assert!(LlmError::Server {
            status: 503,
            message: "busy".into()
        }
        .is_transient());

        assert!(!LlmError::Server {
            status: 400,
            message: "bad request".into()
        }
        .is_transient());
        assert!(!LlmError::MalformedOutput("x".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("m".into()).is_transient());
    }
}
