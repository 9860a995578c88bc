//! argmap storage layer
//!
//! Everything that holds state for a debate build:
//!
//! - [`ArgumentGraph`]: the single-root argument DAG, keyed by [`NodeId`](argmap_domain::NodeId)
//! - [`HnswSimilarityIndex`]: embedding-backed nearest-neighbour search over claim texts
//! - [`GraphExporter`] and [`GraphDocument`]: outline text and node-link JSON
//! - [`DebateLedger`]: SQLite record of which debates of a batch were built
//!
//! # Examples
//!
//! ```
//! use argmap_domain::Valence;
//! use argmap_store::{ArgumentGraph, GraphExporter};
//!
//! let mut graph = ArgumentGraph::new();
//! let root = graph.create_root("We should tax carbon emissions.", "Carbon tax").unwrap();
//! graph.add_child("It funds green infrastructure.", "Revenue", root, Valence::Pro, 0).unwrap();
//!
//! let outline = GraphExporter::new(&graph).outline().unwrap();
//! assert_eq!(outline, "1. We should tax carbon emissions.\n1.1. PRO: It funds green infrastructure.\n");
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod embedding;
pub mod export;
pub mod graph;
pub mod ledger;
pub mod similarity;
pub mod vector_index;

pub use document::{DocumentError, GraphDocument};
pub use embedding::{cosine_similarity, EmbeddingError, HashingEmbedder};
pub use export::GraphExporter;
pub use graph::{ArgumentGraph, GraphError};
pub use ledger::{BuildStatus, DebateLedger, LedgerEntry, LedgerError};
pub use similarity::{HnswSimilarityIndex, SimilarityError};
pub use vector_index::{VectorIndex, VectorIndexError};
