//! Data types for documents, chunks, index entries and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector produced by one embedding model.
pub type Embedding = Vec<f32>;

/// A source document: extracted text plus the identifier of where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Source identifier, usually the file name.
    pub id: String,
    /// The extracted text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A contiguous segment of a [`Document`]'s text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this chunk within its document.
    pub index: usize,
    /// Offset of the first character of this chunk in the document, in characters.
    pub start_char: usize,
    /// Metadata inherited from the parent document.
    pub metadata: HashMap<String, String>,
}

/// An immutable entry stored in a vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Insertion sequence number; the tie-breaker for equal scores.
    pub seq: usize,
    /// The chunk this entry was built from.
    pub chunk: Chunk,
    /// The chunk's embedding.
    pub embedding: Embedding,
}

/// A retrieved chunk paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

impl SearchResult {
    /// The retrieved chunk text.
    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}
