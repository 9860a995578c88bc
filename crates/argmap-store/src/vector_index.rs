//! HNSW vector index over claim embeddings
//!
//! Thin wrapper around `hnsw_rs` that maps the index's internal ids back to
//! [`NodeId`]s and converts cosine distance into similarity.
//!
//! # HNSW Parameters
//!
//! - **M**: bi-directional links per node (16)
//! - **efConstruction**: candidate list size while inserting (200)
//! - **efSearch**: candidate list size while querying, passed per call

use argmap_domain::NodeId;
use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Internal HNSW error
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct IndexState {
    hnsw: Hnsw<'static, f32, DistCosine>,
    id_map: HashMap<usize, NodeId>,
    next_id: usize,
}

impl IndexState {
    fn empty() -> Self {
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
        Self {
            hnsw: Hnsw::<'static, f32, DistCosine>::new(
                DEFAULT_M,
                DEFAULT_MAX_ELEMENTS,
                nb_layer,
                DEFAULT_EF_CONSTRUCTION,
                DistCosine {},
            ),
            id_map: HashMap::new(),
            next_id: 0,
        }
    }
}

/// Nearest-neighbour index of `(NodeId, embedding)` pairs
///
/// # Examples
///
/// ```no_run
/// use argmap_store::vector_index::VectorIndex;
/// use argmap_domain::NodeId;
///
/// let index = VectorIndex::new(3);
/// let id = NodeId::new();
/// index.add(id, &[1.0, 0.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 5, 64).unwrap();
/// assert_eq!(results[0].0, id);
/// ```
pub struct VectorIndex {
    dimension: usize,
    state: Arc<Mutex<IndexState>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension`
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Arc::new(Mutex::new(IndexState::empty())),
        }
    }

    /// Embedding dimension accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an embedding under `id`
    pub fn add(&self, id: NodeId, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let mut state = self.lock()?;
        let internal_id = state.next_id;
        state.next_id += 1;
        state.id_map.insert(internal_id, id);

        let embedding_vec = embedding.to_vec();
        state.hnsw.insert((&embedding_vec, internal_id));
        Ok(())
    }

    /// Search for the `k` nearest neighbours of `query`
    ///
    /// Returns `(NodeId, similarity)` pairs, most similar first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(NodeId, f32)>, VectorIndexError> {
        self.check_dimension(query)?;

        let state = self.lock()?;
        if state.id_map.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(NodeId, f32)> = state
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                state
                    .id_map
                    .get(&neighbour.d_id)
                    .map(|&id| (id, 1.0 - neighbour.distance))
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(results)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.id_map.len()).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every vector
    pub fn clear(&self) -> Result<(), VectorIndexError> {
        let mut state = self.lock()?;
        *state = IndexState::empty();
        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexState>, VectorIndexError> {
        self.state
            .lock()
            .map_err(|e| VectorIndexError::Internal(format!("index lock poisoned: {}", e)))
    }
}
