//! Duplicate detection against claims already in the graph

use crate::error::BuilderError;
use crate::prompt;
use argmap_domain::traits::{Classifier, SimilarClaim, SimilarityIndex};
use argmap_domain::{ArgumentCandidate, NodeId, Valence};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds an existing node equivalent to a new candidate
///
/// A neighbour is equivalent when it plays the same dialectical role
/// towards the target claim and entails, and is entailed by, the candidate.
/// Failures never block the build: the candidate is then treated as new.
pub struct EquivalenceResolver<C: Classifier, S: SimilarityIndex> {
    classifier: Arc<C>,
    index: Arc<S>,
    top_k: usize,
    topic: String,
}

impl<C: Classifier, S: SimilarityIndex> EquivalenceResolver<C, S> {
    /// Create a resolver over `index`
    pub fn new(classifier: Arc<C>, index: Arc<S>, top_k: usize, topic: impl Into<String>) -> Self {
        Self {
            classifier,
            index,
            top_k,
            topic: topic.into(),
        }
    }

    /// Id of an existing node equivalent to `candidate`, if any
    ///
    /// Neighbours are checked from most to least similar; the target and the
    /// root are never candidates.
    pub async fn resolve(
        &self,
        candidate: &ArgumentCandidate,
        target: NodeId,
        target_claim: &str,
        root: NodeId,
    ) -> Option<NodeId> {
        let mut neighbours: Vec<SimilarClaim> = match self.index.search(&candidate.claim, self.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Similarity search failed, treating candidate as new: {}", e);
                return None;
            }
        };
        neighbours.retain(|n| n.id != target && n.id != root);
        if neighbours.is_empty() {
            return None;
        }
        neighbours.sort_by(|a, b| b.score.total_cmp(&a.score));

        let verdicts = join_all(
            neighbours
                .iter()
                .map(|n| self.is_equivalent(candidate, target_claim, n)),
        )
        .await;

        let mut equivalent = None;
        for (neighbour, verdict) in neighbours.iter().zip(verdicts) {
            match verdict {
                Ok(true) => {
                    equivalent = Some(neighbour.id);
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("{}; treating candidate as new", e);
                    return None;
                }
            }
        }
        if let Some(id) = equivalent {
            debug!("'{}' is equivalent to {}", candidate.label, id);
        }
        equivalent
    }

    async fn is_equivalent(
        &self,
        candidate: &ArgumentCandidate,
        target_claim: &str,
        neighbour: &SimilarClaim,
    ) -> Result<bool, BuilderError> {
        let (dialectic, semantic) = tokio::join!(
            self.same_role(target_claim, &neighbour.text, candidate.valence),
            self.mutual_entailment(&candidate.claim, &neighbour.text),
        );
        Ok(dialectic? && semantic?)
    }

    /// Does `reason` confirm (pro) or disconfirm (con) the target claim
    async fn same_role(
        &self,
        target_claim: &str,
        reason: &str,
        valence: Valence,
    ) -> Result<bool, BuilderError> {
        let sequences = [prompt::dialectic_pair(&self.topic, target_claim, reason)];
        let results = self
            .classifier
            .classify(&sequences, &prompt::DIALECTIC_LABELS, Some(prompt::DIALECTIC_TEMPLATE))
            .await
            .map_err(|e| BuilderError::DuplicateResolution(e.to_string()))?;
        Ok(results
            .first()
            .and_then(|r| r.top_label())
            .is_some_and(|label| label == prompt::dialectic_label(valence)))
    }

    /// Do the two claims entail each other
    async fn mutual_entailment(&self, first: &str, second: &str) -> Result<bool, BuilderError> {
        let sequences = [
            prompt::semantic_pair(first, second),
            prompt::semantic_pair(second, first),
        ];
        let results = self
            .classifier
            .classify(&sequences, &prompt::SEMANTIC_LABELS, Some(prompt::SEMANTIC_TEMPLATE))
            .await
            .map_err(|e| BuilderError::DuplicateResolution(e.to_string()))?;
        Ok(results.len() == sequences.len()
            && results.iter().all(|r| r.top_label() == Some(prompt::ENTAILS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmap_llm::MockClassifier;
    use argmap_store::{HashingEmbedder, HnswSimilarityIndex};

    type Index = HnswSimilarityIndex<HashingEmbedder>;

    /// Returns canned hits in the order given, whatever the query
    struct FixedIndex {
        hits: Vec<SimilarClaim>,
    }

    #[async_trait::async_trait]
    impl SimilarityIndex for FixedIndex {
        type Error = String;

        async fn insert(&self, _text: &str, _id: NodeId) -> Result<(), String> {
            Ok(())
        }

        async fn search(&self, _query: &str, k: usize) -> Result<Vec<SimilarClaim>, String> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        fn len(&self) -> usize {
            self.hits.len()
        }
    }

    fn hit(id: NodeId, text: &str, score: f32) -> SimilarClaim {
        SimilarClaim {
            id,
            text: text.to_string(),
            score,
        }
    }

    async fn index_with(claims: &[(&str, NodeId)]) -> Arc<Index> {
        let index = Arc::new(HnswSimilarityIndex::new(Arc::new(HashingEmbedder::default())));
        for (claim, id) in claims {
            index.insert(claim, *id).await.unwrap();
        }
        index
    }

    fn candidate(claim: &str, valence: Valence) -> ArgumentCandidate {
        ArgumentCandidate::new("Label", claim, 0, valence).unwrap()
    }

    #[tokio::test]
    async fn test_equivalent_neighbour_found() {
        let root = NodeId::new();
        let target = NodeId::new();
        let existing = NodeId::new();
        let index = index_with(&[
            ("We should tax carbon.", root),
            ("Carbon taxes raise revenue.", target),
            ("Carbon taxes fund public transport.", existing),
        ])
        .await;

        let mut classifier = MockClassifier::new();
        classifier.add_rule(
            &["Carbon taxes fund public transport."],
            &["directly confirmed by", "entails"],
        );
        let resolver = EquivalenceResolver::new(Arc::new(classifier), index, 3, "Carbon pricing");

        let found = resolver
            .resolve(
                &candidate("Carbon taxes fund public transport.", Valence::Pro),
                target,
                "Carbon taxes raise revenue.",
                root,
            )
            .await;
        assert_eq!(found, Some(existing));
    }

    #[tokio::test]
    async fn test_wrong_dialectical_role_is_not_equivalent() {
        let root = NodeId::new();
        let target = NodeId::new();
        let existing = NodeId::new();
        let index = index_with(&[("Carbon taxes fund public transport.", existing)]).await;

        let mut classifier = MockClassifier::new();
        classifier.add_rule(
            &["Carbon taxes fund public transport."],
            &["directly confirmed by", "entails"],
        );
        let resolver = EquivalenceResolver::new(Arc::new(classifier), index, 3, "Carbon pricing");

        let found = resolver
            .resolve(
                &candidate("Carbon taxes fund public transport.", Valence::Con),
                target,
                "Carbon taxes raise revenue.",
                root,
            )
            .await;
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_target_and_root_excluded() {
        let root = NodeId::new();
        let target = NodeId::new();
        let index = index_with(&[("Same words.", root), ("Same words!", target)]).await;

        let mut classifier = MockClassifier::new();
        classifier.add_rule(&["Same words"], &["directly confirmed by", "entails"]);
        let classifier = Arc::new(classifier);
        let resolver = EquivalenceResolver::new(classifier.clone(), index, 3, "t");

        let found = resolver
            .resolve(&candidate("Same words.", Valence::Pro), target, "Same words!", root)
            .await;
        assert_eq!(found, None);
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_classifier_failure_fails_open() {
        let root = NodeId::new();
        let existing = NodeId::new();
        let index = index_with(&[("Carbon taxes fund public transport.", existing)]).await;

        let mut classifier = MockClassifier::new();
        classifier.add_error("CLAIM_1", argmap_llm::LlmError::Timeout("slow".into()));
        classifier.add_rule(
            &["Carbon taxes fund public transport."],
            &["directly confirmed by", "entails"],
        );
        let resolver = EquivalenceResolver::new(Arc::new(classifier), index, 3, "t");

        let found = resolver
            .resolve(
                &candidate("Carbon taxes fund public transport.", Valence::Pro),
                NodeId::new(),
                "Carbon taxes raise revenue.",
                root,
            )
            .await;
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_most_similar_qualifying_neighbour_wins() {
        let root = NodeId::new();
        let weaker = NodeId::new();
        let stronger = NodeId::new();
        let index = Arc::new(FixedIndex {
            hits: vec![
                hit(weaker, "Carbon taxes pay for buses.", 0.71),
                hit(stronger, "Carbon taxes fund public transport.", 0.93),
            ],
        });

        let mut classifier = MockClassifier::new();
        classifier.add_rule(&["Carbon taxes pay for buses."], &["directly confirmed by", "entails"]);
        classifier.add_rule(
            &["Carbon taxes fund public transport."],
            &["directly confirmed by", "entails"],
        );
        let resolver = EquivalenceResolver::new(Arc::new(classifier), index, 3, "Carbon pricing");

        let found = resolver
            .resolve(
                &candidate("Carbon taxes finance public transit.", Valence::Pro),
                NodeId::new(),
                "Carbon taxes raise revenue.",
                root,
            )
            .await;
        assert_eq!(found, Some(stronger));
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = index_with(&[]).await;
        let resolver = EquivalenceResolver::new(Arc::new(MockClassifier::new()), index, 3, "t");
        let found = resolver
            .resolve(&candidate("Anything.", Valence::Pro), NodeId::new(), "x", NodeId::new())
            .await;
        assert_eq!(found, None);
    }
}
