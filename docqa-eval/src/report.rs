//! Evaluation records and the CSV report sink.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;

/// `predicted_answers` value of a row that could not be answered.
pub const FAILED_MARKER: &str = "[FAILED]";

/// Header of the CSV report.
pub const REPORT_COLUMNS: [&str; 5] = ["id", "question", "predicted_answers", "actual_answers", "result"];

/// How a row ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// The reader produced an answer.
    Answered,
    /// Retrieval found nothing; the fixed no-context answer was recorded.
    NoContext,
    /// The row was malformed or answering it failed.
    Failed,
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Row id from the question file.
    pub id: usize,
    /// The question as asked, after placeholder substitution.
    pub question: String,
    /// The answer text, or [`FAILED_MARKER`].
    pub predicted_answers: String,
    /// The expected answer from the question file.
    pub actual_answers: String,
    /// The orchestrator's raw result, or `{"error": ...}` for failed rows.
    pub result: Value,
    /// How the row ended.
    pub status: RecordStatus,
}

impl EvaluationRecord {
    /// A failed row carrying `error` in its result.
    pub fn failed(
        id: usize,
        question: impl Into<String>,
        actual_answers: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            predicted_answers: FAILED_MARKER.to_string(),
            actual_answers: actual_answers.into(),
            result: serde_json::json!({ "error": error.into() }),
            status: RecordStatus::Failed,
        }
    }

    /// `true` for failed rows.
    pub fn is_failed(&self) -> bool {
        self.status == RecordStatus::Failed
    }
}

/// All records of one client run, in question order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last row finished.
    pub finished_at: DateTime<Utc>,
    /// One record per input row.
    pub records: Vec<EvaluationRecord>,
}

impl EvaluationReport {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if the run had no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of failed rows.
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// Number of rows answered without context.
    pub fn no_context_count(&self) -> usize {
        self.records.iter().filter(|r| r.status == RecordStatus::NoContext).count()
    }

    /// The report file name for `client_name`.
    pub fn file_name(client_name: &str) -> String {
        format!("{client_name}_evaluation_output.csv")
    }

    /// Write the report to `<output_dir>/<client_name>_evaluation_output.csv`.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place, so a reader never observes a partial report. `output_dir` is
    /// created if missing. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Io`](crate::EvalError::Io) or
    /// [`EvalError::Report`](crate::EvalError::Report) on write failure.
    pub fn write_csv(&self, output_dir: &Path, client_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(Self::file_name(client_name));
        let partial = path.with_extension("csv.partial");

        let mut writer = csv::Writer::from_path(&partial)?;
        writer.write_record(REPORT_COLUMNS)?;
        for record in &self.records {
            writer.write_record([
                record.id.to_string(),
                record.question.clone(),
                record.predicted_answers.clone(),
                record.actual_answers.clone(),
                record.result.to_string(),
            ])?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&partial, &path)?;

        info!(
            path = %path.display(),
            row_count = self.records.len(),
            failed = self.failed_count(),
            "wrote evaluation report"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EvaluationReport {
        let now = Utc::now();
        EvaluationReport {
            started_at: now,
            finished_at: now,
            records: vec![
                EvaluationRecord {
                    id: 0,
                    question: "What is the fee?".into(),
                    predicted_answers: "2%".into(),
                    actual_answers: "2%".into(),
                    result: serde_json::json!({ "query": "What is the fee?", "result": "2%" }),
                    status: RecordStatus::Answered,
                },
                EvaluationRecord::failed(1, "42", "n/a", "question is not text"),
            ],
        }
    }

    #[test]
    fn test_write_csv_round_trips_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = report().write_csv(&dir.path().join("out"), "advent").unwrap();
        assert_eq!(path.file_name().unwrap(), "advent_evaluation_output.csv");
        assert!(!path.with_extension("csv.partial").exists());

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, REPORT_COLUMNS);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][2], FAILED_MARKER);
        let result: Value = serde_json::from_str(&rows[0][4]).unwrap();
        assert_eq!(result["result"], "2%");
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.len(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.no_context_count(), 0);
    }
}
