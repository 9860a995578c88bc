//! Building a complete debate from its definition

use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::expander::SubtreeExpander;
use crate::sampling::Personas;
use crate::types::{BuildReport, DebateSpec};
use argmap_domain::traits::{Classifier, LlmProvider, SimilarityIndex};
use argmap_store::ArgumentGraph;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tracing::{error, info};

/// Creates a fresh similarity index for each debate
pub type IndexFactory<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// Builds debates with a shared set of capabilities
///
/// Each debate gets its own graph and similarity index, so debates can be
/// built concurrently with one builder.
pub struct DebateBuilder<L: LlmProvider, C: Classifier, S: SimilarityIndex> {
    llm: Arc<L>,
    classifier: Arc<C>,
    index_factory: IndexFactory<S>,
    personas: Arc<Personas>,
    universal_tags: Vec<String>,
    config: BuilderConfig,
}

impl<L, C, S> DebateBuilder<L, C, S>
where
    L: LlmProvider + 'static,
    C: Classifier + 'static,
    S: SimilarityIndex + 'static,
{
    /// Create a builder
    ///
    /// # Errors
    ///
    /// [`BuilderError::Config`] if the configuration is invalid or there
    /// are no personas.
    pub fn new(
        llm: Arc<L>,
        classifier: Arc<C>,
        index_factory: IndexFactory<S>,
        personas: Personas,
        config: BuilderConfig,
    ) -> Result<Self, BuilderError> {
        config.validate().map_err(BuilderError::Config)?;
        if personas.is_empty() {
            return Err(BuilderError::Config("persona source is empty".to_string()));
        }
        Ok(Self {
            llm,
            classifier,
            index_factory,
            personas: Arc::new(personas),
            universal_tags: Vec::new(),
            config,
        })
    }

    /// Universal tags mixed into every generation request
    pub fn with_universal_tags(mut self, tags: Vec<String>) -> Self {
        self.universal_tags = tags;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build one debate
    ///
    /// # Errors
    ///
    /// [`BuilderError::InvalidDebate`] for a bad definition, or the fatal
    /// error that aborted the build.
    pub async fn build_debate(
        &self,
        spec: &DebateSpec,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<BuildReport, BuilderError> {
        spec.validate().map_err(BuilderError::InvalidDebate)?;
        let started = Instant::now();
        info!(
            "Building debate '{}' with degrees {:?}",
            spec.debate_id, spec.degree_config
        );

        let mut graph = ArgumentGraph::new();
        let root = graph.create_root(spec.motion.claim.clone(), spec.motion.label.clone())?;
        let index = Arc::new((self.index_factory)());
        index
            .insert(&spec.motion.claim, root)
            .await
            .map_err(|e| BuilderError::Index(e.to_string()))?;
        let graph = Arc::new(RwLock::new(graph));

        let expander = Arc::new(
            SubtreeExpander::new(
                self.llm.clone(),
                self.classifier.clone(),
                index,
                graph.clone(),
                self.config.clone(),
                spec.clone(),
            )
            .with_personas(self.personas.clone())
            .with_universal_tags(self.universal_tags.clone()),
        );

        if let Err(e) = expander.clone().run(root, shutdown).await {
            error!("Build of '{}' failed: {}", spec.debate_id, e);
            return Err(e);
        }

        let states = expander.states();
        let stats = expander.stats();
        drop(expander);
        let graph = match Arc::try_unwrap(graph) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().await.clone(),
        };
        graph.validate()?;

        let elapsed = started.elapsed();
        info!(
            "Built debate '{}': {} nodes, {} edges in {:.1}s",
            spec.debate_id,
            graph.node_count(),
            graph.edge_count(),
            elapsed.as_secs_f64()
        );
        Ok(BuildReport {
            debate_id: spec.debate_id.clone(),
            graph,
            states,
            stats,
            elapsed,
        })
    }
}
