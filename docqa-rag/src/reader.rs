//! Reader contract: turns a question plus retrieved context into an answer.
//!
//! The language model itself sits behind [`TextGenerator`], a single
//! `generate(prompt) -> text` call, so local and hosted models are
//! interchangeable. [`PromptReader`] is the standard bridge between the two.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// Default prompt template. `{context}` and `{question}` are substituted.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Use the following context to answer the question at \
the end. Base the answer only on the context. If you don't know the answer, just say that you \
don't know, don't try to make up an answer.\n\n{context}\n\nQuestion: {question}\nAnswer:";

/// The answer produced by a [`Reader`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReaderOutput {
    /// The answer text.
    pub result_text: String,
    /// Full structured output of the reader, kept for the evaluation report.
    pub raw_result: Value,
}

/// Produces an answer from a question and its retrieved context.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Answer `question` using the retrieved `context` chunks (best first).
    async fn read(&self, question: &str, context: &[SearchResult]) -> Result<ReaderOutput>;
}

/// A language model behind a single text-in, text-out call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs and reports.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A [`Reader`] that renders a prompt template and calls a [`TextGenerator`].
///
/// The raw result mirrors a retrieval-QA chain's output:
/// `{"query", "result", "source_documents": [{"id", "document_id", "score", "text"}]}`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::PromptReader;
///
/// let reader = PromptReader::new(Arc::new(model));
/// let output = reader.read("What is the fee?", &results).await?;
/// ```
pub struct PromptReader<G: ?Sized> {
    generator: Arc<G>,
    template: String,
}

impl<G: TextGenerator + ?Sized> PromptReader<G> {
    /// Create a reader using [`DEFAULT_PROMPT_TEMPLATE`].
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator, template: DEFAULT_PROMPT_TEMPLATE.to_string() }
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the template lacks `{context}` or `{question}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains("{context}") || !template.contains("{question}") {
            return Err(RagError::ConfigError(
                "prompt template must contain {context} and {question}".to_string(),
            ));
        }
        self.template = template;
        Ok(self)
    }

    /// Render the prompt for `question` over `context`.
    pub fn render(&self, question: &str, context: &[SearchResult]) -> String {
        let context_text =
            context.iter().map(SearchResult::text).collect::<Vec<_>>().join("\n\n");
        fill_template(&self.template, &context_text, question)
    }
}

/// Substitute `{context}` and `{question}` in one pass; inserted text is
/// never scanned for placeholders.
fn fill_template(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[async_trait]
impl<G: TextGenerator + ?Sized> Reader for PromptReader<G> {
    async fn read(&self, question: &str, context: &[SearchResult]) -> Result<ReaderOutput> {
        let prompt = self.render(question, context);
        debug!(model = self.generator.name(), prompt_len = prompt.len(), "generating answer");

        let result_text = self.generator.generate(&prompt).await.map_err(|e| {
            error!(model = self.generator.name(), error = %e, "generation failed");
            e
        })?;
        let result_text = result_text.trim().to_string();

        let source_documents: Vec<Value> = context
            .iter()
            .map(|r| {
                json!({
                    "id": r.chunk.id,
                    "document_id": r.chunk.document_id,
                    "score": r.score,
                    "text": r.chunk.text,
                })
            })
            .collect();

        let raw_result = json!({
            "query": question,
            "result": result_text,
            "model": self.generator.name(),
            "source_documents": source_documents,
        });

        Ok(ReaderOutput { result_text, raw_result })
    }
}
