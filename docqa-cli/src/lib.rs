//! # docqa-cli
//!
//! The `docqa` command: batch evaluation of question spreadsheets against
//! per-client document folders, and one-off questions.
//!
//! ```text
//! docqa evaluate --config clients.toml [--output-dir DIR] [--client NAME]... [--dry-run]
//! docqa ask --config clients.toml --docs ./policies "What is the management fee?"
//! ```
//!
//! Configuration is read from TOML (see [`config`]); API keys come from the
//! environment or a `.env` file.

pub mod commands;
pub mod config;
pub mod factory;

pub use commands::{
    ClientOutcome, EvaluateOptions, EvaluationSummary, SkippedClient, ask, evaluate,
    format_answer,
};
pub use config::{AppConfig, ClientConfig, EmbeddingConfig, ModelConfig};
pub use factory::{build_embedder, build_generator, build_orchestrator};
