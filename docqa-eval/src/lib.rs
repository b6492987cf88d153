//! # docqa-eval
//!
//! Batch evaluation for docqa: read a question spreadsheet, ask every
//! question through a [`QuestionAnswerer`](docqa_rag::QuestionAnswerer), and
//! write one CSV report per client.
//!
//! ## Components
//!
//! - [`load_questions`] - reads `.xlsx`/`.xls`/`.ods` (via `calamine`) or `.csv`
//! - [`Placeholders`] - per-client token substitution (`FUND`, `MANAGER_OR_ADVISOR`, ...)
//! - [`EvaluationRunner`] - sequential, failure-tolerant batch execution
//! - [`EvaluationReport`] - the records plus [`write_csv`](EvaluationReport::write_csv)
//!
//! ## Report format
//!
//! `<client>_evaluation_output.csv` with columns
//! `id, question, predicted_answers, actual_answers, result`, where `result`
//! is the orchestrator's raw output as JSON. Failed rows carry `[FAILED]` as
//! the prediction and `{"error": "..."}` as the result.

pub mod error;
pub mod placeholders;
pub mod question;
pub mod report;
pub mod runner;

pub use error::{EvalError, Result};
pub use placeholders::Placeholders;
pub use question::{Cell, EXPECTED_COLUMN, QUESTION_COLUMN, QuestionRow, load_questions};
pub use report::{EvaluationRecord, EvaluationReport, FAILED_MARKER, REPORT_COLUMNS, RecordStatus};
pub use runner::EvaluationRunner;
