//! Vector index trait and the ranking rules shared by its implementations.
//!
//! Every index embeds documents and queries through one
//! [`DocumentPreprocessor`], so a corpus and the questions asked of it always
//! live in the same embedding space. Similarity is cosine similarity: scores
//! lie in `[-1, 1]` and higher means more similar. Results are ordered by
//! descending score; equal scores keep insertion order.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::config::IndexKind;
use crate::document::{Chunk, Document, Embedding, IndexEntry, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::FlatIndex;
use crate::ivf::IvfIndex;
use crate::preprocess::DocumentPreprocessor;

/// A searchable store of chunk embeddings built from a corpus.
///
/// Implementations follow a single-writer / multi-reader discipline: `search`
/// may run concurrently with other searches, while `add` swaps in a complete
/// new state under an exclusive lock.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{FlatIndex, VectorIndex};
///
/// let index = FlatIndex::new(preprocessor);
/// index.add(&documents).await?;
/// let results = index.search("What is the fee?", 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short name of the variant, for logs.
    fn name(&self) -> &str;

    /// Build the index from `documents`, replacing any previous contents.
    async fn add(&self, documents: &[Document]) -> Result<()>;

    /// Return up to `k` chunks most similar to `query`, best first.
    ///
    /// Before any successful [`add`](VectorIndex::add) this logs a warning
    /// and returns an empty result instead of failing.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries (zero before the first build).
    async fn len(&self) -> usize;

    /// `true` when no entries are stored.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `true` once a build has completed.
    async fn is_ready(&self) -> bool;
}

/// Construct the index variant selected by `kind`.
pub fn build_index(
    kind: IndexKind,
    preprocessor: Arc<DocumentPreprocessor>,
) -> Result<Arc<dyn VectorIndex>> {
    kind.validate()?;
    Ok(match kind {
        IndexKind::Flat => Arc::new(FlatIndex::new(preprocessor)),
        IndexKind::Ivf { lists, probes } => Arc::new(IvfIndex::new(preprocessor, lists, probes)),
    })
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embed a query with the build-time provider and check it fits the index.
pub(crate) async fn embed_query(
    preprocessor: &DocumentPreprocessor,
    query: &str,
    dimensions: usize,
) -> Result<Embedding> {
    let embedding = preprocessor.embedder().embed(query).await.map_err(|e| {
        error!(error = %e, "query embedding failed");
        e
    })?;
    if embedding.len() != dimensions {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: embedding.len() });
    }
    Ok(embedding)
}

/// Pair chunks with their embeddings, numbering them in insertion order.
pub(crate) fn into_entries(chunks: Vec<Chunk>, embeddings: Vec<Embedding>) -> Vec<IndexEntry> {
    chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(seq, (chunk, embedding))| IndexEntry { seq, chunk, embedding })
        .collect()
}

/// Score `candidates` against `query` and keep the best `k`.
pub(crate) fn rank<'a>(
    candidates: impl Iterator<Item = &'a IndexEntry>,
    query: &[f32],
    k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<(usize, f32, &IndexEntry)> = candidates
        .map(|entry| (entry.seq, cosine_similarity(&entry.embedding, query), entry))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(_, score, entry)| SearchResult { chunk: entry.chunk.clone(), score })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn entry(seq: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            seq,
            chunk: Chunk {
                id: format!("c{seq}"),
                text: format!("chunk {seq}"),
                document_id: "d".into(),
                index: seq,
                start_char: 0,
                metadata: HashMap::new(),
            },
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_descending_and_truncates() {
        let entries =
            vec![entry(0, vec![0.0, 1.0]), entry(1, vec![1.0, 0.0]), entry(2, vec![1.0, 1.0])];
        let results = rank(entries.iter(), &[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "c1");
        assert_eq!(results[1].chunk.id, "c2");
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let entries =
            vec![entry(0, vec![1.0, 0.0]), entry(1, vec![2.0, 0.0]), entry(2, vec![3.0, 0.0])];
        let results = rank(entries.iter().rev(), &[1.0, 0.0], 3);
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn test_rank_zero_k_is_empty() {
        let entries = vec![entry(0, vec![1.0])];
        assert!(rank(entries.iter(), &[1.0], 0).is_empty());
    }
}
