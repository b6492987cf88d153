//! Exact in-memory vector index using cosine similarity.
//!
//! This module provides [`FlatIndex`], a brute-force index backed by a `Vec`
//! protected by a `tokio::sync::RwLock`. Every query is scored against every
//! entry, which is fast enough for the per-client corpora this crate targets.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::{Document, IndexEntry, SearchResult};
use crate::error::Result;
use crate::index::{VectorIndex, embed_query, into_entries, rank};
use crate::preprocess::DocumentPreprocessor;

struct FlatState {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// An exact vector index: every query is compared with every stored entry.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{FlatIndex, VectorIndex};
///
/// let index = FlatIndex::new(Arc::new(preprocessor));
/// index.add(&documents).await?;
/// ```
pub struct FlatIndex {
    preprocessor: Arc<DocumentPreprocessor>,
    state: RwLock<Option<FlatState>>,
}

impl FlatIndex {
    /// Create an empty index that will embed through `preprocessor`.
    pub fn new(preprocessor: Arc<DocumentPreprocessor>) -> Self {
        Self { preprocessor, state: RwLock::new(None) }
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    fn name(&self) -> &str {
        "flat"
    }

    async fn add(&self, documents: &[Document]) -> Result<()> {
        let (chunks, embeddings) = self.preprocessor.process(documents).await?;

        let started = Instant::now();
        let state = FlatState {
            dimensions: self.preprocessor.embedder().dimensions(),
            entries: into_entries(chunks, embeddings),
        };
        let entry_count = state.entries.len();
        *self.state.write().await = Some(state);

        info!(
            index = "flat",
            document_count = documents.len(),
            entry_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built vector index"
        );
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let guard = self.state.read().await;
        let Some(state) = guard.as_ref() else {
            warn!(index = "flat", "vector index is not initialized; call `add` first");
            return Ok(Vec::new());
        };
        if k == 0 || state.entries.is_empty() {
            debug!(index = "flat", k, "nothing to search");
            return Ok(Vec::new());
        }

        let query_embedding = embed_query(&self.preprocessor, query, state.dimensions).await?;
        let results = rank(state.entries.iter(), &query_embedding, k);
        debug!(index = "flat", k, result_count = results.len(), "search completed");
        Ok(results)
    }

    async fn len(&self) -> usize {
        self.state.read().await.as_ref().map_or(0, |state| state.entries.len())
    }

    async fn is_ready(&self) -> bool {
        self.state.read().await.is_some()
    }
}
