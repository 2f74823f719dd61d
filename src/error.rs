use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole run. Nothing is written when one of these is returned.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("cannot open workbook {path}: {reason}")]
    WorkbookOpen { path: PathBuf, reason: String },

    #[error("cannot write report to {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Why a single sheet was left out of the report. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetFailure {
    #[error("sheet could not be read: {0}")]
    Unreadable(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("processing failed: {0}")]
    Processing(#[from] ProcessingFailure),
}

impl SheetFailure {
    /// Short stage label used in run summaries.
    pub fn stage(&self) -> &'static str {
        match self {
            SheetFailure::Unreadable(_) => "read",
            SheetFailure::Validation(_) => "validation",
            SheetFailure::Processing(_) => "processing",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("sheet is empty")]
    EmptySheet,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column '{0}' has no numeric values")]
    NonNumericColumn(String),

    #[error("no row has a date")]
    NoDatedRows,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingFailure {
    #[error("row {row}: column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },
}
