//! Delimited text tables, parsed with the csv crate.
//!
//! Loading is all-or-nothing: every line must carry the layout's column
//! count. Saving builds the whole output in memory and checks every row
//! before the destination is truncated.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::source::TabularSource;
use super::types::{CellValue, Delimiter, Row, Schema, SourceKind};
use crate::error::{MarksError, Result};

pub struct DelimitedSource {
    path: PathBuf,
    delimiter: Delimiter,
    /// Fixed by configuration, otherwise taken from the header on load
    columns: Option<usize>,
    decimal_places: usize,
}

impl DelimitedSource {
    pub fn new(
        path: impl Into<PathBuf>,
        delimiter: Delimiter,
        schema: Option<Schema>,
        decimal_places: usize,
    ) -> Self {
        Self {
            path: path.into(),
            delimiter,
            columns: schema.map(Schema::width),
            decimal_places,
        }
    }
}

impl TabularSource for DelimitedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Delimited
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<Vec<Row>> {
        let file = File::open(&self.path).map_err(|e| MarksError::io(&self.path, e))?;
        let rows = parse_rows(BufReader::new(file), self.delimiter, self.columns)?;
        if let Some(header) = rows.first() {
            self.columns = Some(header.len());
        }
        tracing::debug!("Loaded {} lines from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn persist(&mut self, rows: &[Row]) -> Result<()> {
        let expected = self
            .columns
            .or_else(|| rows.first().map(Vec::len))
            .unwrap_or(0);
        let buffer = encode_rows(rows, self.delimiter, expected, self.decimal_places)?;
        commit(&self.path, &buffer)?;
        tracing::debug!(
            "Wrote {} lines ({} bytes) to {}",
            rows.len(),
            buffer.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Parse a whole text table.
///
/// With `columns` unset the header decides the width, and it must match one
/// of the known layouts.
pub fn parse_rows<R: std::io::Read>(
    input: R,
    delimiter: Delimiter,
    columns: Option<usize>,
) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.char() as u8)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut expected = columns;
    let mut rows: Vec<Row> = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 1);

        let width = match expected {
            Some(width) => width,
            None => {
                let width = record.len();
                if Schema::from_width(width).is_none() {
                    return Err(MarksError::ColumnCount {
                        line,
                        expected: Schema::Marks.width(),
                        found: width,
                    });
                }
                expected = Some(width);
                width
            }
        };

        if record.len() != width {
            return Err(MarksError::ColumnCount {
                line,
                expected: width,
                found: record.len(),
            });
        }

        rows.push(
            record
                .iter()
                .map(|field| CellValue::String(field.to_string()))
                .collect(),
        );
    }

    Ok(rows)
}

/// Serialize rows to bytes, refusing any row whose width is not `expected`
pub fn encode_rows(
    rows: &[Row],
    delimiter: Delimiter,
    expected: usize,
    decimal_places: usize,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.char() as u8)
        .from_writer(Vec::new());

    for (index, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(MarksError::ColumnCount {
                line: index as u64 + 1,
                expected,
                found: row.len(),
            });
        }
        writer.write_record(row.iter().map(|cell| format_cell(cell, decimal_places)))?;
    }

    writer
        .into_inner()
        .map_err(|e| MarksError::Format(format!("Failed to flush CSV buffer: {}", e)))
}

/// Truncate `path` and write `buffer` to it
pub fn commit(path: &Path, buffer: &[u8]) -> Result<()> {
    std::fs::write(path, buffer).map_err(|e| MarksError::io(path, e))
}

fn format_cell(cell: &CellValue, decimal_places: usize) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::String(s) => s.clone(),
        CellValue::Number(n) => format!("{:.*}", decimal_places, n),
        CellValue::Boolean(b) => b.to_string(),
    }
}
