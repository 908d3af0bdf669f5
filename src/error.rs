//! Error types for the marks store

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, MarksError>;

#[derive(Error, Debug)]
pub enum MarksError {
    /// A text row does not have the layout's column count
    #[error("Invalid format at line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Malformed source structure (missing header, no sheets)
    #[error("Invalid format: {0}")]
    Format(String),

    /// Field-level violation in a data row
    #[error("Invalid {field} at row {row}: {message}")]
    Validation {
        row: usize,
        field: String,
        message: String,
    },

    /// Row address outside the data rows
    #[error("Invalid row index: {row} (data rows are 1 to {last})", last = .row_count.saturating_sub(1))]
    Index { row: usize, row_count: usize },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spreadsheet reader or writer failure
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File has been modified since it was loaded. Expected checksum: {expected}, current: {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Store is closed")]
    Closed,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Background task failed to complete
    #[error("Worker error: {0}")]
    Worker(String),
}

impl MarksError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        MarksError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn validation(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        MarksError::Validation {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}
