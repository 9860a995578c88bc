//! Selection of the most salient candidates

use crate::parser::{self, SelectionOutput};
use crate::prompt;
use crate::structured::StructuredCaller;
use argmap_domain::traits::LlmProvider;
use argmap_domain::{ArgumentCandidate, Valence};
use std::sync::Arc;
use tracing::{debug, warn};

/// Narrows a candidate pool to the `k` most salient, independent items
pub struct SalienceSelector<L: LlmProvider> {
    caller: Arc<StructuredCaller<L>>,
}

impl<L: LlmProvider> SalienceSelector<L> {
    /// Create a selector
    pub fn new(caller: Arc<StructuredCaller<L>>) -> Self {
        Self { caller }
    }

    /// Select `min(k, pool.len())` candidates
    ///
    /// Labels echoed by the model are matched exactly, in answer order.
    /// Missing slots are filled from the unselected remainder in pool order.
    pub async fn select(
        &self,
        pool: Vec<ArgumentCandidate>,
        k: usize,
        conclusion: &str,
        valence: Valence,
    ) -> Vec<ArgumentCandidate> {
        let target = k.min(pool.len());
        if pool.len() <= k {
            return pool;
        }

        let labels = match self
            .caller
            .format_json::<SelectionOutput>(
                &prompt::salience(&pool, k, conclusion, valence),
                prompt::SELECTION_SCHEMA,
            )
            .await
        {
            Ok(output) => parser::selection(output),
            Err(e) => {
                warn!("Salience selection failed, filling in pool order: {}", e);
                Vec::new()
            }
        };

        let chosen = match_labels(&pool, &labels, target);
        if chosen.len() < target {
            debug!(
                "Matched {} of {} selected {} labels, filling the rest",
                chosen.len(),
                target,
                valence
            );
        }
        let chosen = fill(chosen, pool.len(), target);

        let mut slots: Vec<Option<ArgumentCandidate>> = pool.into_iter().map(Some).collect();
        chosen.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}

/// Indices of pool items whose label equals a returned label
fn match_labels(pool: &[ArgumentCandidate], labels: &[String], target: usize) -> Vec<usize> {
    let mut chosen: Vec<usize> = Vec::with_capacity(target);
    for label in labels {
        if chosen.len() == target {
            break;
        }
        if let Some(idx) = (0..pool.len()).find(|&i| pool[i].label == *label && !chosen.contains(&i)) {
            chosen.push(idx);
        }
    }
    chosen
}

/// Top up `chosen` with unselected indices in order
fn fill(mut chosen: Vec<usize>, pool_len: usize, target: usize) -> Vec<usize> {
    for idx in 0..pool_len {
        if chosen.len() >= target {
            break;
        }
        if !chosen.contains(&idx) {
            chosen.push(idx);
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use argmap_llm::MockProvider;
    use std::collections::HashSet;

    fn pool(labels: &[&str]) -> Vec<ArgumentCandidate> {
        labels
            .iter()
            .map(|l| ArgumentCandidate::new(*l, format!("{} claim.", l), 0, Valence::Pro).unwrap())
            .collect()
    }

    fn selector(llm: MockProvider) -> (Arc<MockProvider>, SalienceSelector<MockProvider>) {
        let llm = Arc::new(llm);
        let caller = Arc::new(StructuredCaller::new(llm.clone(), &BuilderConfig::default()));
        (llm, SalienceSelector::new(caller))
    }

    #[tokio::test]
    async fn test_small_pool_skips_call() {
        let (llm, selector) = selector(MockProvider::default());
        let chosen = selector.select(pool(&["A", "B"]), 2, "c", Valence::Pro).await;
        assert_eq!(chosen.len(), 2);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_selection_order_preserved() {
        let (_, selector) = selector(MockProvider::new(r#"{"selected": ["D", "B"]}"#));
        let chosen = selector
            .select(pool(&["A", "B", "C", "D"]), 2, "c", Valence::Pro)
            .await;
        let labels: Vec<&str> = chosen.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["D", "B"]);
    }

    #[tokio::test]
    async fn test_hallucinated_labels_filled() {
        let (_, selector) =
            selector(MockProvider::new(r#"{"selected": ["C", "Nonsense", "C"]}"#));
        let chosen = selector
            .select(pool(&["A", "B", "C", "D"]), 3, "c", Valence::Con)
            .await;

        let labels: Vec<&str> = chosen.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "A", "B"]);
        assert_eq!(labels.iter().collect::<HashSet<_>>().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_labels_map_to_distinct_items() {
        let (_, selector) = selector(MockProvider::new(r#"["Same", "Same"]"#));
        let chosen = selector
            .select(pool(&["Same", "Other", "Same"]), 2, "c", Valence::Pro)
            .await;
        assert_eq!(chosen.len(), 2);
        assert!(chosen.iter().all(|c| c.label == "Same"));
    }

    #[tokio::test]
    async fn test_failed_call_still_returns_k() {
        let (_, selector) = selector(MockProvider::new("no json here"));
        let chosen = selector
            .select(pool(&["A", "B", "C"]), 2, "c", Valence::Pro)
            .await;
        let labels: Vec<&str> = chosen.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }
}
