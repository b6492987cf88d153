//! Retrieval-augmented question answering.
//!
//! The [`RagOrchestrator`] coordinates the query phase by composing a
//! [`VectorIndex`] and a [`Reader`]: search, filter by threshold, fit the
//! context into the reader's budget, read.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagOrchestrator, RagConfig};
//!
//! let orchestrator = RagOrchestrator::builder()
//!     .config(RagConfig::default())
//!     .index(index)
//!     .reader(Arc::new(PromptReader::new(model)))
//!     .build()?;
//!
//! let answer = orchestrator.answer("What is the management fee?").await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::reader::Reader;

/// Answer text returned when retrieval finds nothing to ground an answer on.
pub const NO_CONTEXT_ANSWER: &str = "No context available to answer this question.";

/// Separator placed between chunk texts in the assembled context.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    /// The question as asked.
    pub question: String,
    /// The answer text.
    pub text: String,
    /// The assembled context handed to the reader.
    pub context: String,
    /// The chunks the context was built from, best first.
    pub source_chunks: Vec<SearchResult>,
    /// The reader's structured output.
    pub raw_result: Value,
    /// `true` when no context was available and the reader was not consulted.
    pub no_context: bool,
}

impl AnswerResult {
    /// A well-formed result for a question with no retrievable context.
    pub fn no_context(question: impl Into<String>) -> Self {
        let question = question.into();
        let raw_result = json!({
            "query": question,
            "result": NO_CONTEXT_ANSWER,
            "source_documents": [],
        });
        Self {
            question,
            text: NO_CONTEXT_ANSWER.to_string(),
            context: String::new(),
            source_chunks: Vec::new(),
            raw_result,
            no_context: true,
        }
    }
}

/// Anything that can answer a natural-language question.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Answer `question`.
    async fn answer(&self, question: &str) -> Result<AnswerResult>;
}

/// The RAG orchestrator. Construct one via [`RagOrchestrator::builder()`].
pub struct RagOrchestrator {
    config: RagConfig,
    index: Arc<dyn VectorIndex>,
    reader: Arc<dyn Reader>,
}

impl RagOrchestrator {
    /// Create a new [`RagOrchestratorBuilder`].
    pub fn builder() -> RagOrchestratorBuilder {
        RagOrchestratorBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve the top-k chunks for `question` that pass the similarity threshold.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the search fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let results = self.index.search(question, self.config.top_k).await.map_err(|e| {
            error!(index = self.index.name(), error = %e, "vector index search failed");
            RagError::PipelineError(format!("search failed: {e}"))
        })?;

        Ok(match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        })
    }
}

/// Fit ranked chunks into `budget` characters.
///
/// Chunks are kept best-first until the next one would overflow the budget,
/// so the lowest-ranked chunks are the ones dropped. If even the best chunk is
/// too long on its own, it is cut at a character boundary.
pub fn assemble_context(results: Vec<SearchResult>, budget: usize) -> (String, Vec<SearchResult>) {
    let separator_len = CONTEXT_SEPARATOR.chars().count();
    let mut used = 0;
    let mut kept = Vec::new();

    for result in results {
        let len = result.chunk.text.chars().count();
        let extra = if kept.is_empty() { len } else { len + separator_len };
        if used + extra > budget {
            if kept.is_empty() {
                let mut truncated = result;
                truncated.chunk.text = truncated.chunk.text.chars().take(budget).collect();
                kept.push(truncated);
            }
            break;
        }
        used += extra;
        kept.push(result);
    }

    let context = kept.iter().map(SearchResult::text).collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
    (context, kept)
}

#[async_trait]
impl QuestionAnswerer for RagOrchestrator {
    async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let started = Instant::now();

        let results = self.retrieve(question).await?;
        if results.is_empty() {
            warn!(index = self.index.name(), "no context retrieved; answering without reader");
            return Ok(AnswerResult::no_context(question));
        }

        let retrieved = results.len();
        let (context, source_chunks) = assemble_context(results, self.config.max_context_chars);
        if source_chunks.len() < retrieved {
            info!(
                retrieved,
                kept = source_chunks.len(),
                budget = self.config.max_context_chars,
                "dropped low-ranked chunks to fit context budget"
            );
        }

        let output = self.reader.read(question, &source_chunks).await.map_err(|e| match e {
            RagError::ReaderError(_) | RagError::ModelUnavailable { .. } => e,
            other => RagError::ReaderError(other.to_string()),
        })?;

        info!(
            source_count = source_chunks.len(),
            context_chars = context.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "answered question"
        );

        Ok(AnswerResult {
            question: question.to_string(),
            text: output.result_text,
            context,
            source_chunks,
            raw_result: output.raw_result,
            no_context: false,
        })
    }
}

/// Builder for constructing a [`RagOrchestrator`].
///
/// All fields are required. Call [`build()`](RagOrchestratorBuilder::build)
/// to validate and produce the orchestrator.
#[derive(Default)]
pub struct RagOrchestratorBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<dyn VectorIndex>>,
    reader: Option<Arc<dyn Reader>>,
}

impl RagOrchestratorBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vector index to retrieve from.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the reader that produces answers.
    pub fn reader(mut self, reader: Arc<dyn Reader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Build the [`RagOrchestrator`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<RagOrchestrator> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;
        let reader =
            self.reader.ok_or_else(|| RagError::ConfigError("reader is required".to_string()))?;

        Ok(RagOrchestrator { config, index, reader })
    }
}
