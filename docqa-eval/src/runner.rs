//! Sequential evaluation of a question batch against one client's corpus.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use docqa_rag::QuestionAnswerer;
use tracing::{debug, info, warn};

use crate::placeholders::Placeholders;
use crate::question::QuestionRow;
use crate::report::{EvaluationRecord, EvaluationReport, RecordStatus};

/// Asks every question of a batch, one at a time, in input order.
///
/// A malformed row or a failed answer is recorded as a failed row and the
/// batch carries on; `run` itself never fails.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_eval::{EvaluationRunner, Placeholders, load_questions};
///
/// let runner = EvaluationRunner::new(orchestrator)
///     .with_client("advent")
///     .with_placeholders(Placeholders::new().with("FUND", "Advent International GPE X-A SCSp"));
/// let report = runner.run(&load_questions(Path::new("advent.xlsx"))?).await;
/// report.write_csv(Path::new("./out"), "advent")?;
/// ```
pub struct EvaluationRunner {
    answerer: Arc<dyn QuestionAnswerer>,
    placeholders: Placeholders,
    client: String,
}

impl EvaluationRunner {
    /// Create a runner over `answerer` with no placeholders.
    pub fn new(answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self { answerer, placeholders: Placeholders::new(), client: String::new() }
    }

    /// Set the placeholder substitutions applied to every question.
    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Set the client name used in log events.
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Evaluate `rows` and return one record per row, in the same order.
    pub async fn run(&self, rows: &[QuestionRow]) -> EvaluationReport {
        let started_at = Utc::now();
        let started = Instant::now();
        let mut records = Vec::with_capacity(rows.len());

        for (position, row) in rows.iter().enumerate() {
            let record = self.evaluate(row).await;
            debug!(
                client = %self.client,
                row = row.id,
                progress = %format!("{}/{}", position + 1, rows.len()),
                status = ?record.status,
                "evaluated question"
            );
            records.push(record);
        }

        let report = EvaluationReport { started_at, finished_at: Utc::now(), records };
        info!(
            client = %self.client,
            row_count = report.len(),
            failed = report.failed_count(),
            no_context = report.no_context_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation finished"
        );
        report
    }

    async fn evaluate(&self, row: &QuestionRow) -> EvaluationRecord {
        let actual = row.expected.to_string();

        let template = match row.validate() {
            Ok(question) => question,
            Err(e) => {
                warn!(client = %self.client, row = row.id, error = %e, "skipping malformed question row");
                return EvaluationRecord::failed(row.id, row.question.to_string(), actual, e.to_string());
            }
        };
        let question = self.placeholders.apply(template);

        let started = Instant::now();
        match self.answerer.answer(&question).await {
            Ok(answer) => {
                debug!(row = row.id, elapsed_ms = started.elapsed().as_millis() as u64, "answered question");
                let status = if answer.no_context { RecordStatus::NoContext } else { RecordStatus::Answered };
                EvaluationRecord {
                    id: row.id,
                    question,
                    predicted_answers: answer.text,
                    actual_answers: actual,
                    result: answer.raw_result,
                    status,
                }
            }
            Err(e) => {
                warn!(client = %self.client, row = row.id, error = %e, "answering question failed");
                EvaluationRecord::failed(row.id, question, actual, e.to_string())
            }
        }
    }
}
