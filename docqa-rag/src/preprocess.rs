//! Chunk-then-embed production step shared by every index variant.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::document::{Chunk, Document, Embedding};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Composes a [`Chunker`] and an [`EmbeddingProvider`].
///
/// Chunking always runs first; embeddings are computed over chunk text only,
/// one per chunk, in chunk order.
pub struct DocumentPreprocessor {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DocumentPreprocessor {
    /// Create a preprocessor from a chunker and an embedding provider.
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chunker, embedder }
    }

    /// The embedding provider; queries must be embedded with this same instance.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Split `documents` into chunks and embed every chunk.
    ///
    /// Returns chunks and embeddings of equal length, `embeddings[i]` belonging
    /// to `chunks[i]`.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures. Returns [`RagError::EmbeddingError`] if
    /// the provider returns the wrong number of vectors, and
    /// [`RagError::DimensionMismatch`] if any vector differs in length from
    /// the provider's declared dimensionality.
    pub async fn process(&self, documents: &[Document]) -> Result<(Vec<Chunk>, Vec<Embedding>)> {
        let started = Instant::now();

        let chunks = self.chunker.split(documents);
        if chunks.is_empty() {
            info!(document_count = documents.len(), chunk_count = 0, "no chunks to embed");
            return Ok((chunks, Vec::new()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(model = self.embedder.model_id(), error = %e, "embedding failed during preprocessing");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedder.model_id().to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let expected = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
        }

        info!(
            document_count = documents.len(),
            chunk_count = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "processed documents"
        );

        Ok((chunks, embeddings))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::hashing::HashEmbeddingProvider;

    struct ShortChangingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortChangingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Embedding> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
            Ok(vec![vec![1.0, 0.0]])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_process_is_length_preserving() {
        let preprocessor = DocumentPreprocessor::new(
            Arc::new(RecursiveChunker::new(20, 4)),
            Arc::new(HashEmbeddingProvider::new(16).unwrap()),
        );
        let documents = vec![
            Document::new("a", "The management fee is two percent per annum."),
            Document::new("b", "Short."),
        ];
        let (chunks, embeddings) = preprocessor.process(&documents).await.unwrap();
        assert!(chunks.len() > 2);
        assert_eq!(chunks.len(), embeddings.len());
        assert!(embeddings.iter().all(|e| e.len() == 16));
    }

    #[tokio::test]
    async fn test_empty_corpus_produces_nothing() {
        let preprocessor = DocumentPreprocessor::new(
            Arc::new(RecursiveChunker::new(20, 4)),
            Arc::new(HashEmbeddingProvider::new(16).unwrap()),
        );
        let (chunks, embeddings) = preprocessor.process(&[Document::new("a", "")]).await.unwrap();
        assert!(chunks.is_empty());
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_rejected() {
        let preprocessor = DocumentPreprocessor::new(
            Arc::new(RecursiveChunker::new(10, 0)),
            Arc::new(ShortChangingEmbedder),
        );
        let documents = vec![Document::new("a", "one two three four five six seven")];
        let err = preprocessor.process(&documents).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }
}
