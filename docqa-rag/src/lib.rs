//! # docqa-rag
//!
//! Retrieval core for answering questions over a folder of documents.
//!
//! ## Overview
//!
//! The build phase turns a corpus into a searchable index; the query phase
//! answers one question at a time against it:
//!
//! ```text
//! folder ──▶ DirectoryLoader ──▶ Chunker ──▶ EmbeddingProvider ──▶ VectorIndex
//!                                                                      │
//! question ──▶ embed ──▶ top-k search ──▶ threshold ──▶ context budget ──▶ Reader
//! ```
//!
//! - [`DirectoryLoader`] - reads `.pdf`, `.txt` and `.md` files
//! - [`RecursiveChunker`] / [`FixedSizeChunker`] - character-based chunking with overlap
//! - [`HashEmbeddingProvider`] - offline hashing embedder
//! - `OpenAIEmbeddingProvider` - OpenAI embeddings API (feature `openai`)
//! - [`FlatIndex`] / [`IvfIndex`] - exact and approximate cosine indexes
//! - [`PromptReader`] - renders a prompt and calls any [`TextGenerator`]
//! - [`RagOrchestrator`] - composes an index and a reader into a [`QuestionAnswerer`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::*;
//!
//! let config = RagConfig::default();
//! let preprocessor = Arc::new(DocumentPreprocessor::new(
//!     Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)),
//!     Arc::new(HashEmbeddingProvider::new(384)?),
//! ));
//! let index = build_index(IndexKind::Flat, preprocessor)?;
//! index.add(&DirectoryLoader::new().load(Path::new("./docs"))?).await?;
//!
//! let orchestrator = RagOrchestrator::builder()
//!     .config(config)
//!     .index(index)
//!     .reader(Arc::new(PromptReader::new(model)))
//!     .build()?;
//! let answer = orchestrator.answer("What is the management fee?").await?;
//! ```
//!
//! ## Features
//!
//! - `openai` - hosted embeddings via the OpenAI embeddings API
//! - `full` - everything

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod index;
pub mod inmemory;
pub mod ivf;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod preprocess;
pub mod reader;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{IndexKind, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, Embedding, IndexEntry, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::HashEmbeddingProvider;
pub use index::{VectorIndex, build_index};
pub use inmemory::FlatIndex;
pub use ivf::IvfIndex;
pub use loader::{DirectoryLoader, DocumentLoader, PageFilter};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{
    AnswerResult, NO_CONTEXT_ANSWER, QuestionAnswerer, RagOrchestrator, RagOrchestratorBuilder,
    assemble_context,
};
pub use preprocess::DocumentPreprocessor;
pub use reader::{DEFAULT_PROMPT_TEMPLATE, PromptReader, Reader, ReaderOutput, TextGenerator};
