//! Recursive growth of a debate's argument graph
//!
//! Expansion is driven by an explicit worklist of node ids processed by a
//! bounded pool of tokio tasks. Each worker expands one node:
//!
//! 1. look up the degree for the node's depth (zero means leaf)
//! 2. sample personas and extract the node's premises
//! 3. rank premises and draft candidates for every persona concurrently
//! 4. pick the most salient pros and cons
//! 5. commit: resolve duplicates, then add merge edges or new children
//!
//! Step 5 runs under a per-build lock so that duplicate decisions always
//! see every node committed before them. New children go back on the
//! worklist; nodes reached through a merge are never queued again.

use crate::analyzer::ClaimAnalyzer;
use crate::config::BuilderConfig;
use crate::equivalence::EquivalenceResolver;
use crate::error::BuilderError;
use crate::generator::{CandidateGenerator, GenerationRequest};
use crate::salience::SalienceSelector;
use crate::sampling::{Personas, SharedRng, TagMixer};
use crate::structured::StructuredCaller;
use crate::types::{BuildStats, DebateSpec, ExpansionState};
use crate::SharedGraph;
use argmap_domain::traits::{Classifier, LlmProvider, SimilarityIndex};
use argmap_domain::{ArgumentCandidate, NodeId, Valence};
use argmap_store::GraphError;
use futures::future::join_all;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct Counters {
    nodes_expanded: AtomicUsize,
    nodes_created: AtomicUsize,
    merges: AtomicUsize,
    failed_nodes: AtomicUsize,
    unindexed_nodes: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> BuildStats {
        BuildStats {
            nodes_expanded: self.nodes_expanded.load(Ordering::Relaxed),
            nodes_created: self.nodes_created.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            failed_nodes: self.failed_nodes.load(Ordering::Relaxed),
            unindexed_nodes: self.unindexed_nodes.load(Ordering::Relaxed),
        }
    }
}

enum Event {
    Joined(Option<Result<Result<Vec<NodeId>, BuilderError>, JoinError>>),
    Signal(bool),
    SignalClosed,
}

/// Drives the expansion of one debate
pub struct SubtreeExpander<L: LlmProvider, C: Classifier, S: SimilarityIndex> {
    config: BuilderConfig,
    debate: DebateSpec,
    graph: SharedGraph,
    index: Arc<S>,
    analyzer: ClaimAnalyzer<L>,
    generator: CandidateGenerator<L>,
    selector: SalienceSelector<L>,
    resolver: EquivalenceResolver<C, S>,
    personas: Arc<Personas>,
    tags: TagMixer,
    rng: SharedRng,
    commit_lock: tokio::sync::Mutex<()>,
    states: Mutex<HashMap<NodeId, ExpansionState>>,
    counters: Counters,
}

impl<L, C, S> SubtreeExpander<L, C, S>
where
    L: LlmProvider + 'static,
    C: Classifier + 'static,
    S: SimilarityIndex + 'static,
{
    /// Create an expander for `debate` over an already rooted graph
    pub fn new(
        llm: Arc<L>,
        classifier: Arc<C>,
        index: Arc<S>,
        graph: SharedGraph,
        config: BuilderConfig,
        debate: DebateSpec,
    ) -> Self {
        let caller = Arc::new(StructuredCaller::new(llm, &config));
        Self {
            analyzer: ClaimAnalyzer::new(caller.clone(), graph.clone(), &config),
            generator: CandidateGenerator::new(caller.clone()),
            selector: SalienceSelector::new(caller),
            resolver: EquivalenceResolver::new(
                classifier,
                index.clone(),
                config.top_k_retrieval,
                debate.topic.clone(),
            ),
            personas: Arc::new(Personas::default()),
            tags: TagMixer::new(Vec::new(), config.tags_per_cluster),
            rng: SharedRng::new(config.seed),
            commit_lock: tokio::sync::Mutex::new(()),
            states: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            index,
            graph,
            config,
            debate,
        }
    }

    /// Use a different persona source
    pub fn with_personas(mut self, personas: Arc<Personas>) -> Self {
        self.personas = personas;
        self
    }

    /// Universal tags mixed into every generation request
    pub fn with_universal_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = TagMixer::new(tags, self.config.tags_per_cluster);
        self
    }

    /// Expand `start` and everything created beneath it
    ///
    /// At most `max_workers` nodes are expanded at once. Raising the
    /// shutdown signal aborts in-flight workers and returns
    /// [`BuilderError::Cancelled`]; dropping its sender is ignored.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned; node-level failures turn the node
    /// into a leaf.
    pub async fn run(
        self: Arc<Self>,
        start: NodeId,
        mut shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<(), BuilderError> {
        if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(BuilderError::Cancelled);
        }
        self.lock_states().entry(start).or_insert(ExpansionState::Pending);

        let mut queue = VecDeque::from([start]);
        let mut workers = JoinSet::new();
        loop {
            while workers.len() < self.config.max_workers {
                let Some(id) = queue.pop_front() else { break };
                let expander = Arc::clone(&self);
                workers.spawn(async move { expander.expand_node(id).await });
            }
            if workers.is_empty() {
                break;
            }

            let event = match shutdown.as_mut() {
                Some(rx) => tokio::select! {
                    joined = workers.join_next() => Event::Joined(joined),
                    changed = rx.changed() => match changed {
                        Ok(()) => Event::Signal(*rx.borrow()),
                        Err(_) => Event::SignalClosed,
                    },
                },
                None => Event::Joined(workers.join_next().await),
            };

            match event {
                Event::Joined(Some(Ok(Ok(children)))) => queue.extend(children),
                Event::Joined(Some(Ok(Err(e)))) if e.is_fatal() => {
                    error!("Aborting build of '{}': {}", self.debate.debate_id, e);
                    workers.abort_all();
                    return Err(e);
                }
                Event::Joined(Some(Ok(Err(e)))) => warn!("Node expansion failed: {}", e),
                Event::Joined(Some(Err(e))) => {
                    error!("Expansion worker lost: {}", e);
                    workers.abort_all();
                    return Err(BuilderError::Worker(e.to_string()));
                }
                Event::Joined(None) => break,
                Event::Signal(true) => {
                    warn!("Build of '{}' cancelled", self.debate.debate_id);
                    workers.abort_all();
                    return Err(BuilderError::Cancelled);
                }
                Event::Signal(false) => {}
                Event::SignalClosed => shutdown = None,
            }
        }

        let stats = self.stats();
        info!(
            "Expansion of '{}' finished: {} nodes expanded, {} created, {} merges, {} failed",
            self.debate.debate_id,
            stats.nodes_expanded,
            stats.nodes_created,
            stats.merges,
            stats.failed_nodes
        );
        Ok(())
    }

    /// Expand a single node, returning the ids of newly created children
    ///
    /// Nodes that are not pending are skipped. Non-fatal failures are
    /// logged and leave the node as a leaf.
    pub async fn expand_node(&self, id: NodeId) -> Result<Vec<NodeId>, BuilderError> {
        if !self.begin(id) {
            debug!("Skipping {}: not pending", id);
            return Ok(Vec::new());
        }
        let result = match self.expand(id).await {
            Err(e) if !e.is_fatal() => {
                warn!("Node {} becomes a leaf: {}", id, e);
                self.counters.failed_nodes.fetch_add(1, Ordering::Relaxed);
                Ok(Vec::new())
            }
            other => other,
        };
        self.set_state(id, ExpansionState::Expanded);
        self.counters.nodes_expanded.fetch_add(1, Ordering::Relaxed);
        result
    }

    async fn expand(&self, id: NodeId) -> Result<Vec<NodeId>, BuilderError> {
        let depth = self.graph.read().await.depth(id)?;
        let degree = self.debate.degree_at(depth);
        if degree == 0 {
            debug!("Node {} at depth {} is a leaf", id, depth);
            return Ok(Vec::new());
        }

        let personas = self.rng.with(|rng| self.personas.sample(degree, rng));
        let premises = self.analyzer.premises(id).await?;
        if premises.is_empty() {
            info!("No premises for {}, leaving it as a leaf", id);
            return Ok(Vec::new());
        }

        let ranking_tags = self.mixed_tags();
        let ranking = self.generator.rank_premises(&premises, &ranking_tags).await;

        let requests: Vec<(String, Vec<String>)> = personas
            .into_iter()
            .map(|persona| (persona, self.mixed_tags()))
            .collect();
        let batches = join_all(requests.iter().map(|(persona, tags)| {
            self.generator.generate(GenerationRequest {
                premises: &premises,
                ranking: &ranking,
                persona,
                tags,
                n: self.config.args_per_persona,
            })
        }))
        .await;

        let mut pro_pool = Vec::new();
        let mut con_pool = Vec::new();
        for batch in batches {
            pro_pool.extend(batch.pros);
            con_pool.extend(batch.cons);
        }
        debug!(
            "Node {}: {} pro and {} con candidates drafted",
            id,
            pro_pool.len(),
            con_pool.len()
        );

        let claim = self
            .graph
            .read()
            .await
            .node(id)
            .map(|n| n.claim.clone())
            .ok_or(GraphError::NodeNotFound(id))?;
        let (pros, cons) = tokio::join!(
            self.selector.select(pro_pool, degree, &claim, Valence::Pro),
            self.selector.select(con_pool, degree, &claim, Valence::Con),
        );

        let candidates: Vec<ArgumentCandidate> = pros.into_iter().chain(cons).collect();
        let created = self.commit(id, &claim, &candidates).await?;
        info!(
            "Expanded {} at depth {}: {} new children, {} candidates merged",
            id,
            depth,
            created.len(),
            candidates.len() - created.len()
        );
        Ok(created)
    }

    /// Resolve duplicates and write the outcome to the graph and index
    async fn commit(
        &self,
        id: NodeId,
        claim: &str,
        candidates: &[ArgumentCandidate],
    ) -> Result<Vec<NodeId>, BuilderError> {
        let _guard = self.commit_lock.lock().await;

        let root = self.graph.read().await.root().ok_or(GraphError::NoRoot)?;
        let matches = join_all(
            candidates
                .iter()
                .map(|c| self.resolver.resolve(c, id, claim, root)),
        )
        .await;

        let mut created = Vec::new();
        let mut new_claims = Vec::new();
        {
            let mut graph = self.graph.write().await;
            for (candidate, existing) in candidates.iter().zip(matches) {
                match existing {
                    Some(existing) if !graph.would_create_cycle(existing, id) => {
                        if graph.add_edge(existing, id, candidate.valence, candidate.target_index)? {
                            self.counters.merges.fetch_add(1, Ordering::Relaxed);
                            debug!("Merged '{}' into {}", candidate.label, existing);
                        }
                    }
                    existing => {
                        if let Some(existing) = existing {
                            debug!(
                                "Merging '{}' into {} would close a cycle, inserting it",
                                candidate.label, existing
                            );
                        }
                        let child = graph.add_child(
                            candidate.claim.clone(),
                            candidate.label.clone(),
                            id,
                            candidate.valence,
                            candidate.target_index,
                        )?;
                        created.push(child);
                        new_claims.push((child, candidate.claim.as_str()));
                    }
                }
            }
        }

        for (child, text) in new_claims {
            if let Err(e) = self.index.insert(text, child).await {
                warn!("Failed to index {}, later duplicates of it will not be merged: {}", child, e);
                self.counters.unindexed_nodes.fetch_add(1, Ordering::Relaxed);
            }
        }

        {
            let mut states = self.lock_states();
            for child in &created {
                states.insert(*child, ExpansionState::Pending);
            }
        }
        self.counters
            .nodes_created
            .fetch_add(created.len(), Ordering::Relaxed);
        Ok(created)
    }

    fn mixed_tags(&self) -> Vec<String> {
        self.rng.with(|rng| self.tags.mix(&self.debate.tags, rng))
    }

    /// Move `id` from pending to expanding; false if it was not pending
    fn begin(&self, id: NodeId) -> bool {
        let mut states = self.lock_states();
        let state = states.entry(id).or_insert(ExpansionState::Pending);
        if *state != ExpansionState::Pending {
            return false;
        }
        *state = ExpansionState::Expanding;
        true
    }

    fn set_state(&self, id: NodeId, state: ExpansionState) {
        self.lock_states().insert(id, state);
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, HashMap<NodeId, ExpansionState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state of a node
    pub fn state(&self, id: NodeId) -> Option<ExpansionState> {
        self.lock_states().get(&id).copied()
    }

    /// Snapshot of every node's state
    pub fn states(&self) -> HashMap<NodeId, ExpansionState> {
        self.lock_states().clone()
    }

    /// Counters so far
    pub fn stats(&self) -> BuildStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Motion;
    use argmap_llm::{MockClassifier, MockProvider};
    use argmap_store::{ArgumentGraph, HashingEmbedder, HnswSimilarityIndex};
    use tokio::sync::RwLock;

    type Expander = SubtreeExpander<MockProvider, MockClassifier, HnswSimilarityIndex<HashingEmbedder>>;

    fn debate(degrees: Vec<usize>) -> DebateSpec {
        DebateSpec {
            debate_id: "carbon-tax".into(),
            topic: "Carbon pricing".into(),
            motion: Motion {
                claim: "We should tax carbon emissions.".into(),
                label: "Carbon tax".into(),
            },
            tags: vec!["climate".into()],
            degree_config: degrees,
        }
    }

    fn expander_over<S: SimilarityIndex + 'static>(
        llm: MockProvider,
        classifier: MockClassifier,
        index: Arc<S>,
        degrees: Vec<usize>,
    ) -> (Arc<SubtreeExpander<MockProvider, MockClassifier, S>>, SharedGraph, NodeId) {
        let spec = debate(degrees);
        let mut graph = ArgumentGraph::new();
        let root = graph
            .create_root(spec.motion.claim.clone(), spec.motion.label.clone())
            .unwrap();
        let graph = Arc::new(RwLock::new(graph));
        let config = BuilderConfig {
            seed: Some(11),
            ..BuilderConfig::default()
        };
        let expander = SubtreeExpander::new(
            Arc::new(llm),
            Arc::new(classifier),
            index,
            graph.clone(),
            config,
            spec,
        );
        (Arc::new(expander), graph, root)
    }

    fn expander(llm: MockProvider, degrees: Vec<usize>) -> (Arc<Expander>, SharedGraph, NodeId) {
        expander_over(llm, MockClassifier::new(), hashing_index(), degrees)
    }

    fn hashing_index() -> Arc<HnswSimilarityIndex<HashingEmbedder>> {
        Arc::new(HnswSimilarityIndex::new(Arc::new(HashingEmbedder::default())))
    }

    /// Accepts searches but rejects every insert
    struct RejectingIndex;

    #[async_trait::async_trait]
    impl SimilarityIndex for RejectingIndex {
        type Error = String;

        async fn insert(&self, _text: &str, _id: NodeId) -> Result<(), String> {
            Err("index is read-only".to_string())
        }

        async fn search(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<argmap_domain::traits::SimilarClaim>, String> {
            Ok(Vec::new())
        }

        fn len(&self) -> usize {
            0
        }
    }

    fn arguing_provider() -> MockProvider {
        let mut llm = MockProvider::default();
        llm.add_response(
            "Task: Provide supporting",
            r#"{"arguments": [{"label": "Revenue", "claim": "It funds green infrastructure."}]}"#,
        );
        llm.add_response(
            "Task: Provide objections",
            r#"{"arguments": [{"label": "Cost", "claim": "It burdens low-income households."}]}"#,
        );
        llm
    }

    #[tokio::test]
    async fn test_zero_degree_root_is_leaf() {
        let (expander, graph, root) = expander(arguing_provider(), vec![]);
        expander.clone().run(root, None).await.unwrap();

        assert_eq!(graph.read().await.node_count(), 1);
        assert_eq!(expander.state(root), Some(ExpansionState::Expanded));
        assert_eq!(expander.stats().nodes_expanded, 1);
    }

    #[tokio::test]
    async fn test_node_expanded_once() {
        let (expander, graph, root) = expander(arguing_provider(), vec![1]);

        let children = expander.expand_node(root).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(expander.expand_node(root).await.unwrap().is_empty());
        assert_eq!(graph.read().await.node_count(), 3);
        for child in children {
            assert_eq!(expander.state(child), Some(ExpansionState::Pending));
        }
    }

    #[tokio::test]
    async fn test_raised_shutdown_cancels() {
        let (expander, graph, root) = expander(arguing_provider(), vec![1]);
        let (_tx, rx) = watch::channel(true);

        let result = expander.run(root, Some(rx)).await;
        assert!(matches!(result, Err(BuilderError::Cancelled)));
        assert_eq!(graph.read().await.node_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_is_ignored() {
        let (expander, graph, root) = expander(arguing_provider(), vec![1]);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        expander.run(root, Some(rx)).await.unwrap();
        assert_eq!(graph.read().await.node_count(), 3);
    }

    #[tokio::test]
    async fn test_merge_into_ancestor_inserts_new_node() {
        let funds = "It funds green infrastructure.";
        let jobs = "Green infrastructure creates jobs.";
        let mut classifier = MockClassifier::new();
        classifier.add_rule(&[funds], &["directly confirmed by", "entails"]);
        let index = hashing_index();
        let (expander, graph, root) =
            expander_over(MockProvider::default(), classifier, index.clone(), vec![1, 1, 1]);

        let (parent, child) = {
            let mut graph = graph.write().await;
            let parent = graph.add_child(funds, "Revenue", root, Valence::Pro, 0).unwrap();
            let child = graph.add_child(jobs, "Jobs", parent, Valence::Pro, 0).unwrap();
            (parent, child)
        };
        index.insert(funds, parent).await.unwrap();
        index.insert(jobs, child).await.unwrap();

        let candidate = ArgumentCandidate::new("Revenue", funds, 0, Valence::Pro).unwrap();
        let created = expander.commit(child, jobs, &[candidate]).await.unwrap();

        let graph = graph.read().await;
        assert_eq!(created.len(), 1);
        assert_ne!(created[0], parent);
        assert_eq!(graph.node_count(), 4);
        assert!(!graph.has_edge(parent, child));
        assert_eq!(graph.parent_edge(created[0]).map(|e| e.target), Some(child));
        assert!(graph.validate().is_ok());
        assert_eq!(expander.stats().merges, 0);
        assert_eq!(expander.state(created[0]), Some(ExpansionState::Pending));
    }

    #[tokio::test]
    async fn test_failed_index_insert_is_counted() {
        let (expander, graph, root) = expander_over(
            arguing_provider(),
            MockClassifier::new(),
            Arc::new(RejectingIndex),
            vec![1],
        );

        let children = expander.expand_node(root).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(graph.read().await.node_count(), 3);
        let stats = expander.stats();
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.unindexed_nodes, 2);
    }
}
