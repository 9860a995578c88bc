//! Similarity index over claim texts
//!
//! Combines an [`Embedder`] with the HNSW [`VectorIndex`] and keeps the
//! indexed texts so search hits can be handed straight to the equivalence
//! checks.

use crate::vector_index::{VectorIndex, VectorIndexError};
use argmap_domain::traits::{Embedder, SimilarClaim, SimilarityIndex};
use argmap_domain::NodeId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

const DEFAULT_EF_SEARCH: usize = 64;

/// Errors raised by [`HnswSimilarityIndex`]
#[derive(Error, Debug)]
pub enum SimilarityError {
    /// The embedder failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// The vector index failed
    #[error(transparent)]
    Index(#[from] VectorIndexError),

    /// Internal state could not be accessed
    #[error("Similarity index state unavailable: {0}")]
    State(String),
}

/// Embedding-backed similarity index
pub struct HnswSimilarityIndex<E: Embedder> {
    embedder: Arc<E>,
    vectors: VectorIndex,
    texts: Mutex<HashMap<NodeId, String>>,
}

impl<E: Embedder> HnswSimilarityIndex<E> {
    /// Create an empty index using `embedder`
    pub fn new(embedder: Arc<E>) -> Self {
        let dimension = embedder.dimension();
        Self {
            embedder,
            vectors: VectorIndex::new(dimension),
            texts: Mutex::new(HashMap::new()),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SimilarityError> {
        self.embedder
            .embed(text)
            .await
            .map_err(|e| SimilarityError::Embedding(e.to_string()))
    }
}

#[async_trait]
impl<E: Embedder> SimilarityIndex for HnswSimilarityIndex<E> {
    type Error = SimilarityError;

    async fn insert(&self, text: &str, id: NodeId) -> Result<(), Self::Error> {
        let embedding = self.embed(text).await?;
        self.vectors.add(id, &embedding)?;
        self.texts
            .lock()
            .map_err(|e| SimilarityError::State(e.to_string()))?
            .insert(id, text.to_string());
        debug!("Indexed claim {}", id);
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarClaim>, Self::Error> {
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embed(query).await?;
        let hits = self.vectors.search(&embedding, k, DEFAULT_EF_SEARCH)?;

        let texts = self
            .texts
            .lock()
            .map_err(|e| SimilarityError::State(e.to_string()))?;
        Ok(hits
            .into_iter()
            .filter_map(|(id, score)| {
                texts.get(&id).map(|text| SimilarClaim {
                    id,
                    text: text.clone(),
                    score,
                })
            })
            .take(k)
            .collect())
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
