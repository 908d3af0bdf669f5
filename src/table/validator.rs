use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{
    cell_at, CellValue, Row, Schema, EXAM_COUNT, EXAM_FIELDS, NAME_COLUMN, USN_COLUMN,
};
use crate::config::{MarkRange, StoreConfig, Strictness};
use crate::error::{MarksError, Result};
use crate::record::{Marks, StudentRecord};

/// Names longer than this get a warning in table reports
const LONG_NAME_CHARS: usize = 200;

/// A single problem found while checking a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub row: usize,
    pub col: usize,
    pub column_name: String,
    pub message: String,
    pub issue_type: ValidationIssueType,
    pub current_value: CellValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueType {
    MissingRequired,
    TypeMismatch,
    OutOfRange,
    PatternMismatch,
    Duplicate,
}

/// Something odd that does not make the row unreadable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub row: usize,
    pub col: usize,
    pub column_name: String,
    pub message: String,
}

/// Result of checking every data row of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
    pub rows_checked: usize,
}

/// Why a cell was rejected
struct Rejection {
    issue_type: ValidationIssueType,
    message: String,
}

impl Rejection {
    fn new(issue_type: ValidationIssueType, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            message: message.into(),
        }
    }
}

/// Field rules shared by every table format
#[derive(Debug, Clone)]
pub struct Validator {
    strictness: Strictness,
    stored_range: MarkRange,
    input_range: MarkRange,
    aat_range: MarkRange,
    usn_pattern: Option<Regex>,
}

impl Validator {
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let usn_pattern = match config.usn_pattern {
            Some(ref pattern) => Some(Regex::new(pattern).map_err(|e| {
                MarksError::Config(format!("Invalid usn_pattern '{}': {}", pattern, e))
            })?),
            None => None,
        };

        Ok(Self {
            strictness: config.strictness,
            stored_range: config.stored_range,
            input_range: config.input_range,
            aat_range: config.aat_range,
            usn_pattern,
        })
    }

    /// Map data row `row_idx` to a record.
    ///
    /// Strict reads fail on the first bad field; lenient reads substitute
    /// `""` or `0.0` and log a warning.
    pub fn decode_record(
        &self,
        row: &[CellValue],
        row_idx: usize,
        schema: Schema,
    ) -> Result<StudentRecord> {
        let name = self.read_field(
            row_idx,
            "Name",
            check_identity(cell_at(row, NAME_COLUMN)),
            String::new,
        )?;
        let usn = self.read_field(
            row_idx,
            "USN",
            check_identity(cell_at(row, USN_COLUMN)).and_then(|usn| self.check_usn(usn)),
            String::new,
        )?;

        let mut exams = [0.0; EXAM_COUNT];
        for (index, slot) in exams.iter_mut().enumerate() {
            let cell = cell_at(row, schema.exam_column(index));
            *slot = self.read_field(
                row_idx,
                EXAM_FIELDS[index],
                check_mark(cell, self.stored_range),
                || lenient_number(cell),
            )?;
        }

        let aat = match schema.aat_column() {
            Some(col) => {
                let cell = cell_at(row, col);
                if cell.is_empty() {
                    0.0
                } else {
                    self.read_field(row_idx, "AAT", check_mark(cell, self.aat_range), || {
                        lenient_number(cell)
                    })?
                }
            }
            None => 0.0,
        };

        Ok(StudentRecord::new(name, usn, exams).with_aat(aat))
    }

    fn read_field<T>(
        &self,
        row_idx: usize,
        field: &str,
        checked: std::result::Result<T, Rejection>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T> {
        match checked {
            Ok(value) => Ok(value),
            Err(rejection) => match self.strictness {
                Strictness::Strict => Err(MarksError::validation(row_idx, field, rejection.message)),
                Strictness::Lenient => {
                    tracing::warn!(
                        "Row {} {}: {}; using default",
                        row_idx,
                        field,
                        rejection.message
                    );
                    Ok(fallback())
                }
            },
        }
    }

    fn check_usn(&self, usn: String) -> std::result::Result<String, Rejection> {
        match self.usn_pattern {
            Some(ref pattern) if !pattern.is_match(&usn) => Err(Rejection::new(
                ValidationIssueType::PatternMismatch,
                format!("'{}' does not match pattern '{}'", usn, pattern.as_str()),
            )),
            _ => Ok(usn),
        }
    }

    /// Check marks entered for `row` before they reach the table.
    ///
    /// Input is always checked strictly, whatever the read policy.
    pub fn check_input(&self, marks: &Marks, row: usize) -> Result<()> {
        for (index, value) in marks.exams.iter().enumerate() {
            if !value.is_finite() || !self.input_range.contains(*value) {
                return Err(MarksError::validation(
                    row,
                    EXAM_FIELDS[index],
                    format!("marks must be between {}, got {}", self.input_range, value),
                ));
            }
        }

        if let Some(aat) = marks.aat {
            if !aat.is_finite() || !self.aat_range.contains(aat) {
                return Err(MarksError::validation(
                    row,
                    "AAT",
                    format!("marks must be between {}, got {}", self.aat_range, aat),
                ));
            }
        }

        Ok(())
    }

    /// Check every data row and collect all problems instead of stopping
    /// at the first one. Checks are strict regardless of the read policy.
    pub fn validate_table(&self, rows: &[Row], schema: Schema) -> ValidationReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut seen_usns: HashMap<String, usize> = HashMap::new();

        for (row_idx, row) in rows.iter().enumerate().skip(1) {
            let mut push_issue = |col: usize, rejection: Rejection| {
                issues.push(ValidationIssue {
                    row: row_idx,
                    col,
                    column_name: schema.column_name(col).to_string(),
                    message: rejection.message,
                    issue_type: rejection.issue_type,
                    current_value: cell_at(row, col).clone(),
                });
            };

            match check_identity(cell_at(row, NAME_COLUMN)) {
                Ok(name) if name.chars().count() > LONG_NAME_CHARS => {
                    warnings.push(ValidationWarning {
                        row: row_idx,
                        col: NAME_COLUMN,
                        column_name: "Name".to_string(),
                        message: format!("Very long name ({} characters)", name.chars().count()),
                    })
                }
                Ok(_) => {}
                Err(rejection) => push_issue(NAME_COLUMN, rejection),
            }

            match check_identity(cell_at(row, USN_COLUMN)).and_then(|usn| self.check_usn(usn)) {
                Ok(usn) => {
                    if let Some(first) = seen_usns.get(&usn) {
                        push_issue(
                            USN_COLUMN,
                            Rejection::new(
                                ValidationIssueType::Duplicate,
                                format!("USN '{}' already used at row {}", usn, first),
                            ),
                        );
                    } else {
                        seen_usns.insert(usn, row_idx);
                    }
                }
                Err(rejection) => push_issue(USN_COLUMN, rejection),
            }

            for index in 0..EXAM_COUNT {
                let col = schema.exam_column(index);
                if let Err(rejection) = check_mark(cell_at(row, col), self.stored_range) {
                    push_issue(col, rejection);
                }
            }

            if let Some(col) = schema.aat_column() {
                let cell = cell_at(row, col);
                if !cell.is_empty() {
                    if let Err(rejection) = check_mark(cell, self.aat_range) {
                        push_issue(col, rejection);
                    }
                }
            }

            if row.len() > schema.width() {
                warnings.push(ValidationWarning {
                    row: row_idx,
                    col: schema.width(),
                    column_name: schema.column_name(schema.width()).to_string(),
                    message: format!(
                        "{} extra columns beyond the {} layout are ignored",
                        row.len() - schema.width(),
                        schema.width()
                    ),
                });
            }
        }

        ValidationReport {
            is_valid: issues.is_empty(),
            issues,
            warnings,
            rows_checked: rows.len().saturating_sub(1),
        }
    }
}

fn check_identity(cell: &CellValue) -> std::result::Result<String, Rejection> {
    if cell.is_empty() {
        return Err(Rejection::new(ValidationIssueType::MissingRequired, "value is empty"));
    }
    Ok(cell.as_text())
}

fn check_mark(cell: &CellValue, range: MarkRange) -> std::result::Result<f64, Rejection> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().map_err(|_| {
            Rejection::new(
                ValidationIssueType::TypeMismatch,
                format!("'{}' is not a number", s.trim()),
            )
        })?,
        CellValue::Empty | CellValue::String(_) => {
            return Err(Rejection::new(ValidationIssueType::MissingRequired, "value is empty"))
        }
        CellValue::Boolean(b) => {
            return Err(Rejection::new(
                ValidationIssueType::TypeMismatch,
                format!("expected a number but got boolean {}", b),
            ))
        }
    };

    if !value.is_finite() || !range.contains(value) {
        return Err(Rejection::new(
            ValidationIssueType::OutOfRange,
            format!("must be between {}, got {}", range, value),
        ));
    }

    Ok(value)
}

/// Best-effort number used by lenient reads: out-of-range values pass
/// through, anything unparsable is `0.0`
pub(crate) fn lenient_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn strict() -> Validator {
        Validator::from_config(&StoreConfig::default()).unwrap()
    }

    fn lenient() -> Validator {
        Validator::from_config(&StoreConfig::default().lenient()).unwrap()
    }

    fn header() -> Row {
        Schema::Marks.headers().iter().map(|h| text(h)).collect()
    }

    #[test]
    fn test_decode_valid_row() {
        let row = vec![text("Alice"), text("USN001"), text("40"), CellValue::Number(35.0), text(" 45 ")];
        let record = strict().decode_record(&row, 1, Schema::Marks).unwrap();

        assert_eq!(record.name(), "Alice");
        assert_eq!(record.usn(), "USN001");
        assert_eq!(record.exams(), [40.0, 35.0, 45.0]);
        assert_eq!(record.total(), 120.0);
        assert_eq!(record.average(), 40.0);
    }

    #[test]
    fn test_strict_rejects_empty_name() {
        let row = vec![text("  "), text("USN001"), text("1"), text("2"), text("3")];
        let err = strict().decode_record(&row, 4, Schema::Marks).unwrap_err();

        match err {
            MarksError::Validation { row, field, .. } => {
                assert_eq!(row, 4);
                assert_eq!(field, "Name");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_strict_rejects_out_of_range_and_unparsable() {
        let row = vec![text("Alice"), text("USN001"), text("101"), text("2"), text("3")];
        let err = strict().decode_record(&row, 1, Schema::Marks).unwrap_err();
        assert!(matches!(err, MarksError::Validation { ref field, .. } if field == "Exam1"));

        let row = vec![text("Alice"), text("USN001"), text("1"), text("abc"), text("3")];
        let err = strict().decode_record(&row, 1, Schema::Marks).unwrap_err();
        assert!(err.to_string().contains("'abc' is not a number"));
        assert!(err.to_string().contains("Exam2"));
    }

    #[test]
    fn test_lenient_substitutes_defaults() {
        let row = vec![CellValue::Empty, text("USN001"), text("abc"), CellValue::Boolean(true)];
        let record = lenient().decode_record(&row, 1, Schema::Marks).unwrap();

        assert_eq!(record.name(), "");
        assert_eq!(record.exams(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lenient_keeps_out_of_range_values() {
        let row = vec![text("Alice"), text("USN001"), text("150"), text("2"), text("3")];
        let record = lenient().decode_record(&row, 1, Schema::Marks).unwrap();
        assert_eq!(record.exam(0), Some(150.0));
    }

    #[test]
    fn test_decode_reads_aat_when_present() {
        let mut row = vec![text("Alice"), text("USN001"), text("10"), text("20"), text("30"), text("7")];
        let record = strict().decode_record(&row, 1, Schema::Final).unwrap();
        assert_eq!(record.aat(), 7.0);

        row[5] = CellValue::Empty;
        let record = strict().decode_record(&row, 1, Schema::Final).unwrap();
        assert_eq!(record.aat(), 0.0);
    }

    #[test]
    fn test_usn_pattern() {
        let config = StoreConfig {
            usn_pattern: Some(r"^\d[A-Z]{2}\d{2}[A-Z]{2}\d{3}$".to_string()),
            ..StoreConfig::default()
        };
        let validator = Validator::from_config(&config).unwrap();

        let row = vec![text("Alice"), text("1RV21CS001"), text("1"), text("2"), text("3")];
        assert!(validator.decode_record(&row, 1, Schema::Marks).is_ok());

        let row = vec![text("Alice"), text("USN001"), text("1"), text("2"), text("3")];
        let err = validator.decode_record(&row, 1, Schema::Marks).unwrap_err();
        assert!(matches!(err, MarksError::Validation { ref field, .. } if field == "USN"));
    }

    #[test]
    fn test_check_input_uses_input_range() {
        let validator = strict();
        assert!(validator.check_input(&Marks::new(0.0, 25.0, 50.0), 1).is_ok());

        let err = validator.check_input(&Marks::new(10.0, 51.0, 20.0), 3).unwrap_err();
        assert!(matches!(err, MarksError::Validation { row: 3, ref field, .. } if field == "Exam2"));

        let err = validator.check_input(&Marks::new(f64::NAN, 1.0, 1.0), 1).unwrap_err();
        assert!(matches!(err, MarksError::Validation { .. }));

        let err = validator
            .check_input(&Marks::new(1.0, 1.0, 1.0).with_aat(-1.0), 1)
            .unwrap_err();
        assert!(matches!(err, MarksError::Validation { ref field, .. } if field == "AAT"));
    }

    #[test]
    fn test_validate_table_collects_every_issue() {
        let rows = vec![
            header(),
            vec![text("Alice"), text("USN001"), text("40"), text("35"), text("45")],
            vec![text(""), text("USN002"), text("x"), text("200"), text("1")],
            vec![text("Carol"), text("USN001"), text("1"), text("2"), text("3")],
        ];

        let report = strict().validate_table(&rows, Schema::Marks);
        assert!(!report.is_valid);
        assert_eq!(report.rows_checked, 3);
        assert_eq!(report.issues.len(), 4);

        let types: Vec<_> = report.issues.iter().map(|i| (i.row, i.issue_type)).collect();
        assert!(types.contains(&(2, ValidationIssueType::MissingRequired)));
        assert!(types.contains(&(2, ValidationIssueType::TypeMismatch)));
        assert!(types.contains(&(2, ValidationIssueType::OutOfRange)));
        assert!(types.contains(&(3, ValidationIssueType::Duplicate)));
    }

    #[test]
    fn test_validate_table_ignores_policy() {
        let rows = vec![
            header(),
            vec![text("Alice"), text("USN001"), text("abc"), text("35"), text("45")],
        ];
        let report = lenient().validate_table(&rows, Schema::Marks);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_validate_table_warns_on_extra_columns() {
        let rows = vec![
            header(),
            vec![text("Alice"), text("USN001"), text("1"), text("2"), text("3"), text("extra")],
        ];
        let report = strict().validate_table(&rows, Schema::Marks);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&text(" 12.5 ")), 12.5);
        assert_eq!(lenient_number(&text("nope")), 0.0);
        assert_eq!(lenient_number(&CellValue::Empty), 0.0);
        assert_eq!(lenient_number(&CellValue::Number(3.0)), 3.0);
    }
}
