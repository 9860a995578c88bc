//! Premise extraction with write-once caching

use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::parser::{self, PremisesOutput};
use crate::prompt;
use crate::structured::StructuredCaller;
use crate::SharedGraph;
use argmap_domain::traits::LlmProvider;
use argmap_domain::NodeId;
use argmap_store::GraphError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Extracts and caches the premises of claims
///
/// Premises are fetched with at most one generation call per node, even
/// when several workers ask for the same node at once: concurrent callers
/// share a single in-flight request.
pub struct ClaimAnalyzer<L: LlmProvider> {
    caller: Arc<StructuredCaller<L>>,
    graph: SharedGraph,
    inflight: Mutex<HashMap<NodeId, Arc<OnceCell<Vec<String>>>>>,
    max_premises: usize,
}

impl<L: LlmProvider> ClaimAnalyzer<L> {
    /// Create an analyzer over `graph`
    pub fn new(caller: Arc<StructuredCaller<L>>, graph: SharedGraph, config: &BuilderConfig) -> Self {
        Self {
            caller,
            graph,
            inflight: Mutex::new(HashMap::new()),
            max_premises: config.max_premises,
        }
    }

    /// Premises of `id`
    ///
    /// The root's premises are its own claim. Other nodes are analysed in
    /// the context of their parent claim and edge valence.
    ///
    /// # Errors
    ///
    /// [`BuilderError::GraphInvariant`] if the node is unknown or has no
    /// parent edge, [`BuilderError::MissingPremises`] if the generation call
    /// fails.
    pub async fn premises(&self, id: NodeId) -> Result<Vec<String>, BuilderError> {
        let (claim, parent_claim, valence) = {
            let graph = self.graph.read().await;
            let node = graph.node(id).ok_or(GraphError::NodeNotFound(id))?;
            if graph.root() == Some(id) {
                return Ok(vec![node.claim.clone()]);
            }
            if let Some(cached) = &node.premises {
                return Ok(cached.clone());
            }
            let edge = graph.parent_edge(id).ok_or(GraphError::Orphan(id))?;
            let parent = graph
                .node(edge.target)
                .ok_or(GraphError::NodeNotFound(edge.target))?;
            (node.claim.clone(), parent.claim.clone(), edge.valence)
        };

        let cell = {
            let mut inflight = self.inflight.lock().await;
            // A finished extraction drops its entry after caching on the node
            if let Some(cached) = self.cached(id).await {
                return Ok(cached);
            }
            inflight.entry(id).or_default().clone()
        };

        let result = cell
            .get_or_try_init(|| async {
                let output: PremisesOutput = self
                    .caller
                    .draft_json(
                        &prompt::premises(&claim, &parent_claim, valence, self.max_premises),
                        prompt::PREMISES_SCHEMA,
                    )
                    .await
                    .map_err(|e| BuilderError::MissingPremises {
                        node: id.to_string(),
                        reason: e.to_string(),
                    })?;
                let premises = parser::premises(output, self.max_premises);
                debug!("Extracted {} premises for {}", premises.len(), id);
                self.graph.write().await.set_premises(id, premises.clone())?;
                Ok::<_, BuilderError>(premises)
            })
            .await
            .cloned();

        let mut inflight = self.inflight.lock().await;
        if inflight.get(&id).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
            inflight.remove(&id);
        }
        result
    }

    async fn cached(&self, id: NodeId) -> Option<Vec<String>> {
        self.graph.read().await.node(id).and_then(|n| n.premises.clone())
    }
}
