use std::path::{Path, PathBuf};

use super::reader::read_first_sheet;
use super::source::TabularSource;
use super::types::{Row, SourceKind};
use super::writer::write_sheet;
use crate::error::{MarksError, Result};

/// First worksheet of an `.xlsx` workbook.
///
/// Cells are read with calamine and written back through umya-spreadsheet,
/// which keeps the other sheets and the formatting intact.
pub struct WorkbookSource {
    path: PathBuf,
    sheet_name: Option<String>,
    /// Rows as last read from or written to disk
    baseline: Vec<Row>,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet_name: None,
            baseline: Vec::new(),
        }
    }
}

impl TabularSource for WorkbookSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Workbook
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<Vec<Row>> {
        let sheet = read_first_sheet(&self.path)?;
        self.sheet_name = Some(sheet.sheet_name);
        self.baseline = sheet.rows.clone();
        Ok(sheet.rows)
    }

    fn persist(&mut self, rows: &[Row]) -> Result<()> {
        let sheet = self
            .sheet_name
            .as_deref()
            .ok_or_else(|| MarksError::Workbook("Workbook was never loaded".to_string()))?;

        let cells = write_sheet(&self.path, sheet, &self.baseline, rows)?;
        tracing::debug!(
            "Wrote {} changed cells to sheet '{}' of {}",
            cells,
            sheet,
            self.path.display()
        );

        self.baseline = rows.to_vec();
        Ok(())
    }

    fn release(&mut self) {
        self.baseline.clear();
        self.sheet_name = None;
    }
}
