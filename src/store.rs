//! Row-addressable marks store.
//!
//! Row 0 is the header; data rows are `1..row_count()`. The whole table is
//! held in memory and written back in one piece by [`MarksStore::save`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::{MarksError, Result};
use crate::record::{AverageScale, Marks, StudentRecord};
use crate::table::validator::lenient_number;
use crate::table::{
    compute_checksum, create_backup, delimited, open_source, CellValue, Delimiter, Row, Schema,
    SourceKind, TabularSource, ValidationReport, Validator,
};

/// Aggregates over every readable data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub students: usize,
    /// Rows that failed validation and were left out
    pub skipped: usize,
    pub mean_total: Option<f64>,
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    pub mean_final: Option<f64>,
}

pub struct MarksStore {
    source: Box<dyn TabularSource>,
    rows: Vec<Row>,
    schema: Schema,
    config: StoreConfig,
    validator: Validator,
    /// Checksum of the file as last loaded or saved
    checksum: Option<String>,
    dirty: bool,
    closed: bool,
}

impl MarksStore {
    /// Load the file at `path`, choosing the adapter from its extension
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let source = open_source(path.as_ref(), &config)?;
        Self::from_source(source, config)
    }

    /// Load every row through `source`. Any loader error aborts construction.
    pub fn from_source(mut source: Box<dyn TabularSource>, config: StoreConfig) -> Result<Self> {
        let validator = Validator::from_config(&config)?;

        let checksum = if config.verify_checksum {
            Some(compute_checksum(source.path())?)
        } else {
            None
        };

        let rows = source.load()?;
        let header = rows.first().ok_or_else(|| {
            MarksError::Format(format!("{} has no header row", source.path().display()))
        })?;
        let schema = config.schema.unwrap_or_else(|| Schema::from_header(header));

        tracing::debug!(
            "Opened {} as {:?} with {:?} layout, {} data rows",
            source.path().display(),
            source.kind(),
            schema,
            rows.len() - 1
        );

        Ok(Self {
            source,
            rows,
            schema,
            config,
            validator,
            checksum,
            dirty: false,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Number of rows, header included
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Index of the last data row, 0 when there are none
    pub fn last_data_row(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn header(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(CellValue::as_text).collect())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(MarksError::Closed);
        }
        Ok(())
    }

    /// Fails unless `row` addresses a data row
    pub fn ensure_row(&self, row: usize) -> Result<()> {
        self.ensure_open()?;
        if row < 1 || row >= self.rows.len() {
            return Err(MarksError::Index {
                row,
                row_count: self.rows.len(),
            });
        }
        Ok(())
    }

    pub fn get_record(&self, row: usize) -> Result<StudentRecord> {
        self.ensure_row(row)?;
        self.validator.decode_record(&self.rows[row], row, self.schema)
    }

    /// Every data row with its decoded record
    pub fn records(&self) -> impl Iterator<Item = (usize, Result<StudentRecord>)> + '_ {
        (1..self.rows.len()).map(move |row| (row, self.get_record(row)))
    }

    /// Overwrite the marks of `row` and recompute its derived columns.
    ///
    /// Nothing is written to disk until [`save`](Self::save). On error the
    /// table is left as it was.
    pub fn update_marks(&mut self, row: usize, marks: &Marks) -> Result<()> {
        self.ensure_row(row)?;
        self.validator.check_input(marks, row)?;

        let schema = self.schema;
        if marks.aat.is_some() && schema.aat_column().is_none() {
            return Err(MarksError::validation(
                row,
                "AAT",
                format!("the {:?} layout has no AAT column", schema),
            ));
        }

        let cells = &mut self.rows[row];
        if cells.len() < schema.width() {
            cells.resize(schema.width(), CellValue::Empty);
        }

        for (index, value) in marks.exams.iter().enumerate() {
            cells[schema.exam_column(index)] = CellValue::Number(*value);
        }

        let aat = match schema.aat_column() {
            Some(col) => match marks.aat {
                Some(aat) => {
                    cells[col] = CellValue::Number(aat);
                    aat
                }
                None => lenient_number(&cells[col]),
            },
            None => 0.0,
        };

        let total = marks.total();
        write_derived(cells, schema, self.config.average_scale, total, aat);

        self.dirty = true;
        tracing::debug!("Updated marks for row {}: total {}", row, total);
        Ok(())
    }

    /// Write the whole table back to its file
    pub fn save(&mut self) -> Result<()> {
        self.ensure_open()?;
        let path = self.source.path().to_path_buf();

        if let Some(ref expected) = self.checksum {
            let actual = compute_checksum(&path)?;
            if &actual != expected {
                tracing::warn!("{} changed on disk since it was loaded", path.display());
                return Err(MarksError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        if self.config.backup_on_save {
            create_backup(&path)?;
        }

        self.source.persist(&self.rows)?;
        self.dirty = false;

        if self.config.verify_checksum {
            self.checksum = Some(compute_checksum(&path)?);
        }

        tracing::info!("Saved {} data rows to {}", self.data_row_count(), path.display());
        Ok(())
    }

    pub fn has_previous(&self, row: usize) -> bool {
        row > 1
    }

    pub fn has_next(&self, row: usize) -> bool {
        row < self.last_data_row()
    }

    /// Check every data row without stopping at the first problem
    pub fn validate(&self) -> ValidationReport {
        self.validator.validate_table(&self.rows, self.schema)
    }

    pub fn summary(&self) -> ClassSummary {
        let scale = self.config.average_scale;
        let mut totals = Vec::new();
        let mut finals = Vec::new();
        let mut skipped = 0;

        for (_, record) in self.records() {
            match record {
                Ok(record) => {
                    totals.push(record.total());
                    finals.push(record.final_marks(scale));
                }
                Err(_) => skipped += 1,
            }
        }

        let mean = |values: &[f64]| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };

        ClassSummary {
            students: totals.len(),
            skipped,
            mean_total: mean(&totals),
            min_total: totals.iter().copied().reduce(f64::min),
            max_total: totals.iter().copied().reduce(f64::max),
            mean_final: mean(&finals),
        }
    }

    /// Write header and data rows to a delimited file, padded or cut to the
    /// layout's width. Returns the path written.
    ///
    /// Derived columns are recomputed from each row's marks. Under the strict
    /// policy a row that does not decode fails the export.
    pub fn export_csv(&self, path: impl AsRef<Path>, delimiter: Delimiter) -> Result<PathBuf> {
        self.ensure_open()?;
        let path = path.as_ref();
        let width = self.schema.width();
        let scale = self.config.average_scale;

        let mut rows: Vec<Row> = Vec::with_capacity(self.rows.len());
        for (row_idx, source_row) in self.rows.iter().enumerate() {
            let mut row = source_row.clone();
            row.resize(width, CellValue::Empty);
            if row_idx > 0 {
                let record = self.validator.decode_record(source_row, row_idx, self.schema)?;
                write_derived(&mut row, self.schema, scale, record.total(), record.aat());
            }
            rows.push(row);
        }

        let buffer = delimited::encode_rows(&rows, delimiter, width, self.config.decimal_places)?;
        delimited::commit(path, &buffer)?;
        tracing::info!("Exported {} data rows to {}", self.data_row_count(), path.display());

        Ok(path.to_path_buf())
    }

    /// Release the backing source. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.dirty {
            tracing::warn!("Closing {} with unsaved changes", self.source.path().display());
        }
        self.source.release();
        self.closed = true;
        tracing::debug!("Closed {}", self.source.path().display());
    }
}

/// Overwrite the total, average and final cells the layout carries.
/// `cells` must be at least the layout's width.
fn write_derived(cells: &mut Row, schema: Schema, scale: AverageScale, total: f64, aat: f64) {
    let average = scale.apply(total);

    if let Some(col) = schema.total_column() {
        cells[col] = CellValue::Number(total);
    }
    if let Some(col) = schema.average_column() {
        cells[col] = CellValue::Number(average);
    }
    if let Some(col) = schema.final_column() {
        cells[col] = CellValue::Number(average + aat);
    }
}

impl Drop for MarksStore {
    fn drop(&mut self) {
        self.close();
    }
}
