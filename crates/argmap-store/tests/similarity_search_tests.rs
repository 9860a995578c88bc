//! Similarity search over claim texts with the offline embedder

use argmap_domain::traits::SimilarityIndex;
use argmap_domain::NodeId;
use argmap_store::{HashingEmbedder, HnswSimilarityIndex};
use std::sync::Arc;

#[tokio::test]
async fn test_nearest_claim_shares_vocabulary() {
    let index = HnswSimilarityIndex::new(Arc::new(HashingEmbedder::default()));

    let revenue = NodeId::new();
    index
        .insert("A carbon tax raises revenue for green infrastructure.", revenue)
        .await
        .unwrap();
    index
        .insert("School uniforms reduce bullying in classrooms.", NodeId::new())
        .await
        .unwrap();
    index
        .insert("Remote work improves employee wellbeing.", NodeId::new())
        .await
        .unwrap();

    let hits = index
        .search("Carbon tax revenue pays for green infrastructure.", 3)
        .await
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, revenue);
    assert!(hits[0].score >= hits[1].score);
    assert!(hits[1].score >= hits[2].score);
}

#[tokio::test]
async fn test_empty_query_is_an_error() {
    let index = HnswSimilarityIndex::new(Arc::new(HashingEmbedder::new(32)));
    index.insert("Some claim.", NodeId::new()).await.unwrap();

    assert!(index.search("   ", 1).await.is_err());
}
