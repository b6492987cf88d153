//! Mock text generator for tests and dry runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::TextGenerator;
use tokio::sync::Mutex;

use crate::error::ModelError;

#[derive(Debug, Clone)]
enum Behavior {
    Canned(String),
    Echo,
    Fail(String),
}

/// A [`TextGenerator`] that never leaves the process.
///
/// - [`MockModel::new`] always answers with the same text
/// - [`MockModel::echo`] answers with the context section of the prompt
/// - [`MockModel::failing`] fails every call with an inference error
///
/// Every prompt is recorded and can be inspected with [`MockModel::prompts`].
#[derive(Debug)]
pub struct MockModel {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    fn with_behavior(behavior: Behavior) -> Self {
        Self { name: "mock".to_string(), behavior, calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
    }

    /// Always answer with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Canned(response.into()))
    }

    /// Answer with the text between the prompt's first blank line and its
    /// `Question:` line, i.e. the retrieved context. Prompts without that
    /// shape are echoed whole.
    pub fn echo() -> Self {
        Self::with_behavior(Behavior::Echo)
    }

    /// Fail every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    /// Override the reported model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

fn extract_context(prompt: &str) -> &str {
    let body = prompt.split_once("\n\n").map_or(prompt, |(_, rest)| rest);
    match body.rfind("\n\nQuestion:") {
        Some(end) => &body[..end],
        None => prompt,
    }
}

#[async_trait]
impl TextGenerator for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> docqa_rag::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        match &self.behavior {
            Behavior::Canned(response) => Ok(response.clone()),
            Behavior::Echo => Ok(extract_context(prompt).to_string()),
            Behavior::Fail(message) => {
                Err(ModelError::Inference { model: self.name.clone(), message: message.clone() }.into())
            }
        }
    }
}
