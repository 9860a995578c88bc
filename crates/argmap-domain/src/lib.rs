//! argmap Domain Layer
//!
//! This crate contains the core vocabulary of a debate map: the identifiers,
//! value objects, and trait interfaces every other layer depends upon.
//! Apart from UUID generation and the `async-trait` shim it carries no
//! infrastructure.
//!
//! ## Key Concepts
//!
//! - **Node**: An atomic claim in the argument graph, with a short label and
//!   lazily cached premises
//! - **Edge**: A directed PRO/CON relation from a child claim to the parent
//!   premise it addresses
//! - **Valence**: Whether a child supports (PRO) or attacks (CON) its parent
//! - **ArgumentCandidate**: A validated, generated argument that has not yet
//!   been placed in the graph
//!
//! ## Architecture
//!
//! - Pure data and invariants only
//! - External capabilities (text generation, zero-shot classification,
//!   embeddings, similarity search) are trait seams implemented elsewhere

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod argument;
pub mod id;
pub mod node;
pub mod traits;
pub mod valence;

// Re-exports for convenience
pub use argument::ArgumentCandidate;
pub use id::NodeId;
pub use node::{ArgumentEdge, Node};
pub use valence::Valence;
