//! Property tests for vector index search.

use std::sync::Arc;

use docqa_rag::{
    Document, DocumentPreprocessor, FlatIndex, HashEmbeddingProvider, IndexKind, IvfIndex,
    RecursiveChunker, VectorIndex, build_index,
};
use docqa_telemetry::{CaptureLayer, CapturedEvents};
use proptest::prelude::*;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

const DIM: usize = 256;

fn preprocessor() -> Arc<DocumentPreprocessor> {
    Arc::new(DocumentPreprocessor::new(
        Arc::new(RecursiveChunker::new(40, 5)),
        Arc::new(HashEmbeddingProvider::new(DIM).unwrap()),
    ))
}

/// Documents built from lower-case words, so every chunk carries at least one token.
fn arb_documents() -> impl Strategy<Value = Vec<Document>> {
    proptest::collection::vec(proptest::collection::vec("[a-z]{3,8}", 1..30), 1..6).prop_map(
        |docs| {
            docs.into_iter()
                .enumerate()
                .map(|(i, words)| Document::new(format!("doc{i}"), words.join(" ")))
                .collect()
        },
    )
}

mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn results_bounded_sorted_and_deterministic(
            documents in arb_documents(),
            query in "[a-z]{3,8}( [a-z]{3,8}){0,4}",
            k in 0usize..12,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (first, second, len) = rt.block_on(async {
                let index = FlatIndex::new(preprocessor());
                index.add(&documents).await.unwrap();
                let first = index.search(&query, k).await.unwrap();
                let second = index.search(&query, k).await.unwrap();
                (first, second, index.len().await)
            });

            prop_assert!(first.len() <= k);
            prop_assert_eq!(first.len(), k.min(len));
            for window in first.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
            prop_assert_eq!(first, second);
        }

        #[test]
        fn every_chunk_retrieves_itself_with_top_score(documents in arb_documents()) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let preprocessor = preprocessor();
                let (chunks, embeddings) = preprocessor.process(&documents).await.unwrap();
                let index = FlatIndex::new(preprocessor);
                index.add(&documents).await.unwrap();

                for (chunk, embedding) in chunks.iter().zip(&embeddings) {
                    // Hash collisions can cancel every token of a tiny chunk.
                    if embedding.iter().all(|x| *x == 0.0) {
                        continue;
                    }
                    let results = index.search(&chunk.text, 1).await.unwrap();
                    assert_eq!(results.len(), 1);
                    assert!(results[0].score > 0.999, "self score was {}", results[0].score);
                }
            });
        }

        #[test]
        fn ivf_with_full_probing_matches_flat(
            documents in arb_documents(),
            query in "[a-z]{3,8}( [a-z]{3,8}){0,4}",
            lists in 1usize..6,
            k in 1usize..8,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (flat, ivf) = rt.block_on(async {
                let flat = FlatIndex::new(preprocessor());
                let ivf = IvfIndex::new(preprocessor(), lists, lists);
                flat.add(&documents).await.unwrap();
                ivf.add(&documents).await.unwrap();
                (flat.search(&query, k).await.unwrap(), ivf.search(&query, k).await.unwrap())
            });

            prop_assert_eq!(flat, ivf);
        }
    }
}

#[tokio::test]
async fn test_search_before_add_is_empty_and_warns() {
    let events = CapturedEvents::new();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(events.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    for kind in [IndexKind::Flat, IndexKind::Ivf { lists: 4, probes: 2 }] {
        let index = build_index(kind, preprocessor()).unwrap();
        assert!(!index.is_ready().await);
        assert!(index.search("What is the fee?", 3).await.unwrap().is_empty());
    }

    assert_eq!(events.matching(Level::WARN, "not initialized").len(), 2);
}

#[tokio::test]
async fn test_add_replaces_previous_contents() {
    let index = FlatIndex::new(preprocessor());
    index.add(&[Document::new("old", "management fee two percent")]).await.unwrap();
    index.add(&[Document::new("new", "carried interest twenty percent")]).await.unwrap();

    assert_eq!(index.len().await, 1);
    let results = index.search("management fee", 5).await.unwrap();
    assert!(results.iter().all(|r| r.chunk.document_id == "new"));
}

#[tokio::test]
async fn test_add_of_empty_corpus_is_ready_but_empty() {
    let index = FlatIndex::new(preprocessor());
    index.add(&[]).await.unwrap();
    assert!(index.is_ready().await);
    assert!(index.is_empty().await);
    assert!(index.search("anything", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_searches_agree() {
    let index = Arc::new(FlatIndex::new(preprocessor()));
    index
        .add(&[
            Document::new("a", "Fees are 2%. Returns were 10% over 3 years."),
            Document::new("b", "The fund invests in listed equities across Europe."),
        ])
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.search("What is the fee?", 2).await.unwrap() })
        })
        .collect();

    let mut answers = Vec::new();
    for handle in handles {
        answers.push(handle.await.unwrap());
    }
    assert!(answers.windows(2).all(|w| w[0] == w[1]));
}
