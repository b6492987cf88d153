//! Question source: the spreadsheet of questions and expected answers.
//!
//! A question file is a table whose header row contains a `questions` and an
//! `actual_answers` column (matched case-insensitively; other columns are
//! ignored). Excel and OpenDocument workbooks are read through `calamine`
//! (first sheet only), CSV files through `csv`. The whole file is read before
//! any question is asked.

use std::fmt;
use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EvalError, Result};

/// Column holding the questions.
pub const QUESTION_COLUMN: &str = "questions";
/// Column holding the expected answers.
pub const EXPECTED_COLUMN: &str = "actual_answers";

/// A raw cell value, before any validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text.
    Text(String),
    /// Any numeric cell.
    Number(f64),
    /// A boolean cell.
    Bool(bool),
    /// An empty cell.
    Empty,
}

impl Cell {
    /// `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The text of a `Text` cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_csv(field: &str) -> Self {
        if field.is_empty() { Cell::Empty } else { Cell::Text(field.to_string()) }
    }
}

impl From<&DataType> for Cell {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Empty => Cell::Empty,
            DataType::String(s) => Cell::Text(s.clone()),
            DataType::Int(i) => Cell::Number(*i as f64),
            DataType::Float(f) => Cell::Number(*f),
            DataType::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Empty => Ok(()),
        }
    }
}

/// One row of the question file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    /// Zero-based position among the data rows.
    pub id: usize,
    /// The question cell, possibly templated with placeholder tokens.
    pub question: Cell,
    /// The expected answer cell.
    pub expected: Cell,
}

impl QuestionRow {
    /// Create a row from text cells.
    pub fn new(id: usize, question: impl Into<String>, expected: impl Into<String>) -> Self {
        Self { id, question: Cell::Text(question.into()), expected: Cell::Text(expected.into()) }
    }

    /// Return the question text, or why the row cannot be asked.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::QuestionRow`] if the question is not non-empty
    /// text or the expected answer is missing.
    pub fn validate(&self) -> Result<&str> {
        let question = match &self.question {
            Cell::Text(s) if !s.trim().is_empty() => s.as_str(),
            Cell::Text(_) | Cell::Empty => {
                return Err(self.malformed("question is empty"));
            }
            other => {
                return Err(self.malformed(format!("question is not text (found '{other}')")));
            }
        };
        if self.expected.is_blank() {
            return Err(self.malformed("expected answer is missing"));
        }
        Ok(question)
    }

    fn malformed(&self, message: impl Into<String>) -> EvalError {
        EvalError::QuestionRow { row: self.id, message: message.into() }
    }
}

/// Read every question row from `path`.
///
/// # Errors
///
/// Returns [`EvalError::QuestionSource`] if the file cannot be opened or
/// parsed, has an unsupported extension, or lacks a required column.
pub fn load_questions(path: &Path) -> Result<Vec<QuestionRow>> {
    let extension =
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();
    let grid = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        other => return Err(source_error(path, format!("unsupported question file type '{other}'"))),
    };

    let rows = rows_from_grid(grid).map_err(|message| source_error(path, message))?;
    info!(path = %path.display(), row_count = rows.len(), "loaded questions");
    Ok(rows)
}

fn source_error(path: &Path, message: impl Into<String>) -> EvalError {
    EvalError::QuestionSource { path: path.display().to_string(), message: message.into() }
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| source_error(path, e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| source_error(path, "workbook has no sheets"))?
        .map_err(|e| source_error(path, e.to_string()))?;
    debug!(path = %path.display(), rows = range.height(), columns = range.width(), "read first sheet");
    Ok(range.rows().map(|row| row.iter().map(Cell::from).collect()).collect())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| source_error(path, e.to_string()))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| source_error(path, e.to_string()))?;
        grid.push(record.iter().map(Cell::from_csv).collect());
    }
    Ok(grid)
}

/// Turn a header row plus data rows into question rows.
///
/// Rows with every cell blank are skipped; ids still count them so that an
/// id always points at the same spreadsheet row.
fn rows_from_grid(grid: Vec<Vec<Cell>>) -> std::result::Result<Vec<QuestionRow>, String> {
    let mut rows = grid.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| "file is empty".to_string())?
        .iter()
        .map(|cell| cell.to_string().trim().to_lowercase())
        .collect();

    let column = |name: &str| {
        header.iter().position(|h| h == name).ok_or_else(|| format!("missing required column '{name}'"))
    };
    let question_col = column(QUESTION_COLUMN)?;
    let expected_col = column(EXPECTED_COLUMN)?;

    Ok(rows
        .enumerate()
        .filter(|(_, cells)| !cells.iter().all(Cell::is_blank))
        .map(|(id, cells)| {
            let cell = |i: usize| cells.get(i).cloned().unwrap_or(Cell::Empty);
            QuestionRow { id, question: cell(question_col), expected: cell(expected_col) }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_rows_from_grid_finds_columns_case_insensitively() {
        let grid = vec![
            vec![text("ID"), text(" Questions "), text("ACTUAL_ANSWERS")],
            vec![Cell::Number(1.0), text("What is the fee?"), text("2%")],
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
            vec![Cell::Number(3.0), Cell::Number(42.0), text("n/a")],
        ];
        let rows = rows_from_grid(grid).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], QuestionRow::new(0, "What is the fee?", "2%"));
        assert_eq!(rows[1].id, 2);
        assert_eq!(rows[1].question, Cell::Number(42.0));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let grid = vec![vec![text("questions"), text("answers")]];
        assert_eq!(rows_from_grid(grid).unwrap_err(), "missing required column 'actual_answers'");
    }

    #[test]
    fn test_short_rows_are_padded_with_empty_cells() {
        let grid = vec![vec![text("questions"), text("actual_answers")], vec![text("Why?")]];
        let rows = rows_from_grid(grid).unwrap();
        assert_eq!(rows[0].expected, Cell::Empty);
    }

    #[test]
    fn test_validate_rejects_non_text_and_missing_answers() {
        let numeric = QuestionRow { id: 1, question: Cell::Number(42.0), expected: text("x") };
        assert!(matches!(numeric.validate(), Err(EvalError::QuestionRow { row: 1, .. })));

        let unanswered = QuestionRow { id: 2, question: text("Why?"), expected: Cell::Empty };
        assert!(unanswered.validate().is_err());

        let ok = QuestionRow { id: 3, question: text("Why?"), expected: Cell::Number(7.0) };
        assert_eq!(ok.validate().unwrap(), "Why?");
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(42.0).to_string(), "42");
        assert_eq!(Cell::Number(0.5).to_string(), "0.5");
        assert_eq!(Cell::Bool(true).to_string(), "true");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_load_csv_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.csv");
        std::fs::write(&path, "questions,actual_answers\nWhat is the fee?,2%\n\"Who manages FUND?\",Acme\n")
            .unwrap();
        let rows = load_questions(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].question.as_text(), Some("Who manages FUND?"));
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let err = load_questions(Path::new("questions.json")).unwrap_err();
        assert!(matches!(err, EvalError::QuestionSource { .. }));
        let err = load_questions(Path::new("/no/such/questions.xlsx")).unwrap_err();
        assert!(matches!(err, EvalError::QuestionSource { .. }));
    }
}
