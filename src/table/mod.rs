//! Table module for reading, validating and writing marks tables.
//!
//! This module provides:
//! - Workbook (`.xlsx`) and delimited text (`.csv`, `.tsv`) adapters behind
//!   one `TabularSource` trait
//! - Field validation shared by every format
//! - Checksums and backups of the backing file

pub mod types;
pub mod reader;
pub mod writer;
pub mod delimited;
pub mod workbook;
pub mod source;
pub mod validator;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::compute_checksum;
pub use writer::create_backup;
pub use delimited::DelimitedSource;
pub use workbook::WorkbookSource;
pub use source::{open_source, TabularSource};
pub use validator::{
    ValidationIssue, ValidationIssueType, ValidationReport, ValidationWarning, Validator,
};
