//! # docqa-model
//!
//! Language models for docqa, each exposed as a
//! [`TextGenerator`](docqa_rag::TextGenerator): one prompt in, one completion out.
//!
//! - [`OpenAIChatModel`] - OpenAI chat completions, or any compatible server (feature `openai`)
//! - [`MockModel`] - canned, echo or failing responses for tests and dry runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{OpenAIChatConfig, OpenAIChatModel};
//! use docqa_rag::PromptReader;
//!
//! // Hosted OpenAI
//! let model = OpenAIChatModel::new(OpenAIChatConfig::new(api_key, "gpt-4o-mini"))?;
//!
//! // Local Ollama
//! let local = OpenAIChatModel::compatible("", "http://localhost:11434/v1", "llama3.1:8b")?;
//!
//! let reader = PromptReader::new(Arc::new(model));
//! ```

pub mod error;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use error::{ModelError, Result};
pub use mock::MockModel;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatConfig, OpenAIChatModel};
