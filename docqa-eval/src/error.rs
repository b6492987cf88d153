//! Error types for the `docqa-eval` crate.

use docqa_rag::RagError;
use thiserror::Error;

/// Errors raised while reading questions or writing reports.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The question file is missing, unreadable, or lacks a required column.
    #[error("Cannot read questions from '{path}': {message}")]
    QuestionSource {
        /// The question file.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A single question row is malformed.
    #[error("Question row {row} is malformed: {message}")]
    QuestionRow {
        /// Zero-based row id.
        row: usize,
        /// What is wrong with the row.
        message: String,
    },

    /// The CSV report could not be written.
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline failure.
    #[error(transparent)]
    Rag(#[from] RagError),
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
