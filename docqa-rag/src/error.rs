//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and question-answering operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document folder is missing, unreadable, or yielded nothing loadable.
    #[error("Failed to load corpus from '{path}': {message}")]
    CorpusLoadFailure {
        /// The folder that was being loaded.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding model or language model could not be initialised or reached.
    #[error("Model unavailable ({model}): {message}")]
    ModelUnavailable {
        /// The model or backend that is unavailable.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index was queried before a successful build.
    ///
    /// `search` recovers from this locally; the variant exists for callers
    /// that need to require a built index explicitly.
    #[error("Vector index is not ready: call `add` first")]
    IndexNotReady,

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding does not match the dimensionality of the index.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index was built with.
        expected: usize,
        /// The dimensionality that was supplied.
        actual: usize,
    },

    /// The reader failed to produce an answer.
    #[error("Reader error: {0}")]
    ReaderError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Returns `true` for failures that make a whole corpus run impossible
    /// (as opposed to failures scoped to a single question).
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            RagError::CorpusLoadFailure { .. }
                | RagError::ModelUnavailable { .. }
                | RagError::ConfigError(_)
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
