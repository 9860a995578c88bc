//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between the debate-building logic and
//! infrastructure. Every method that reaches out to a model or service is
//! async: each call is a suspension point for the builder's workers.
//! Implementations live in `argmap-llm` (network clients, mocks) and
//! `argmap-store` (similarity index).

use crate::NodeId;
use async_trait::async_trait;
use std::fmt::Display;

/// Sampling parameters for a generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationParams {
    /// Create generation parameters
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(1024, 0.0)
    }
}

/// Trait for text generation providers
///
/// Implemented by the infrastructure layer (argmap-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for generation operations
    type Error: Display + Send + Sync + 'static;

    /// Generate a free-text completion
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, Self::Error>;

    /// Generate output meant to be JSON matching `schema`
    ///
    /// The returned text is raw model output; callers repair and parse it.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &str,
        params: GenerationParams,
    ) -> Result<String, Self::Error>;
}

/// Result of a zero-shot classification of one input sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The classified sequence
    pub sequence: String,

    /// Candidate labels ranked by score, best first
    pub labels: Vec<String>,

    /// Scores aligned with `labels`
    pub scores: Vec<f64>,
}

impl Classification {
    /// The best-scoring label, if any
    pub fn top_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// Trait for zero-shot (NLI-based) classifiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Error type for classification operations
    type Error: Display + Send + Sync + 'static;

    /// Classify each sequence against the candidate labels
    ///
    /// `hypothesis_template` contains a `{}` placeholder for the label.
    /// Results are returned in input order.
    async fn classify(
        &self,
        sequences: &[String],
        labels: &[&str],
        hypothesis_template: Option<&str>,
    ) -> Result<Vec<Classification>, Self::Error>;
}

/// Trait for text embedding models
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Error type for embedding operations
    type Error: Display + Send + Sync + 'static;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Dimension of the produced vectors
    fn dimension(&self) -> usize;
}

/// A hit returned by a similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarClaim {
    /// Node the indexed text belongs to
    pub id: NodeId,

    /// The indexed claim text
    pub text: String,

    /// Similarity score, higher is more similar
    pub score: f32,
}

/// Trait for the similarity index over claim texts
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Error type for index operations
    type Error: Display + Send + Sync + 'static;

    /// Index a claim text under a node id
    async fn insert(&self, text: &str, id: NodeId) -> Result<(), Self::Error>;

    /// Retrieve up to `k` indexed claims, most similar first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarClaim>, Self::Error>;

    /// Number of indexed texts
    fn len(&self) -> usize;

    /// Whether nothing has been indexed yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_label() {
        let result = Classification {
            sequence: "text".to_string(),
            labels: vec!["entails".to_string(), "contradicts".to_string()],
            scores: vec![0.9, 0.1],
        };
        assert_eq!(result.top_label(), Some("entails"));

        let empty = Classification {
            sequence: "text".to_string(),
            labels: vec![],
            scores: vec![],
        };
        assert_eq!(empty.top_label(), None);
    }
}
