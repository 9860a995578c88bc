//! argmap Builder
//!
//! Grows a debate map recursively from a single motion using a language
//! model, a zero-shot classifier and a similarity index.
//!
//! # Overview
//!
//! Starting from the root claim, every node is expanded into pro and con
//! arguments that target its premises. Each expansion extracts and caches
//! the node's premises, drafts candidates from several personas, keeps the
//! most salient ones and merges those that duplicate an existing claim.
//!
//! # Architecture
//!
//! ```text
//! DebateSpec → DebateBuilder → SubtreeExpander ─┬→ ClaimAnalyzer
//!                                               ├→ CandidateGenerator
//!                                               ├→ SalienceSelector
//!                                               └→ EquivalenceResolver → ArgumentGraph
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use argmap_builder::{BuilderConfig, DebateBuilder, DebateSpec, Motion, Personas};
//! use argmap_llm::{MockClassifier, MockProvider};
//! use argmap_store::{GraphExporter, HashingEmbedder, HnswSimilarityIndex};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(HashingEmbedder::default());
//! let builder = DebateBuilder::new(
//!     Arc::new(MockProvider::default()),
//!     Arc::new(MockClassifier::new()),
//!     Arc::new(move || HnswSimilarityIndex::new(embedder.clone())),
//!     Personas::default(),
//!     BuilderConfig::default(),
//! )?;
//!
//! let spec = DebateSpec {
//!     debate_id: "carbon-tax".to_string(),
//!     topic: "Carbon pricing".to_string(),
//!     motion: Motion {
//!         claim: "We should tax carbon emissions.".to_string(),
//!         label: "Carbon tax".to_string(),
//!     },
//!     tags: vec!["climate".to_string()],
//!     degree_config: vec![2, 1],
//! };
//!
//! let report = builder.build_debate(&spec, None).await?;
//! println!("{}", GraphExporter::new(&report.graph).outline()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod batch;
mod builder;
mod config;
mod equivalence;
mod error;
mod expander;
mod generator;
mod parser;
mod prompt;
mod salience;
mod sampling;
mod structured;
mod types;


use argmap_store::ArgumentGraph;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The graph of one build, shared by its workers
pub type SharedGraph = Arc<RwLock<ArgumentGraph>>;

pub use analyzer::ClaimAnalyzer;
pub use batch::{BatchReport, DebateBatch, DebateOutcome};
pub use builder::{DebateBuilder, IndexFactory};
pub use config::BuilderConfig;
pub use equivalence::EquivalenceResolver;
pub use error::BuilderError;
pub use expander::SubtreeExpander;
pub use generator::{CandidateBatch, CandidateGenerator, GenerationRequest};
pub use salience::SalienceSelector;
pub use sampling::{Personas, SharedRng, TagMixer};
pub use structured::StructuredCaller;
pub use types::{BuildReport, BuildStats, DebateManifest, DebateSpec, ExpansionState, Motion};
