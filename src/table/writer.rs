use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use super::types::{CellValue, Row};
use crate::error::{MarksError, Result};

/// Write `rows` into `sheet` of the workbook at `path`, preserving everything
/// else in the file.
///
/// Only cells that differ from `baseline` (the rows as they were loaded) are
/// touched, so untouched cells keep their original type and formatting.
/// Returns the number of cells written.
pub fn write_sheet(path: &Path, sheet: &str, baseline: &[Row], rows: &[Row]) -> Result<u32> {
    let mut book = reader::xlsx::read(path).map_err(|e| {
        MarksError::Workbook(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    let worksheet = book
        .get_sheet_by_name_mut(sheet)
        .ok_or_else(|| MarksError::Workbook(format!("Sheet not found: {}", sheet)))?;

    let mut cells_written = 0;
    for (row_idx, row) in rows.iter().enumerate() {
        let before = baseline.get(row_idx);
        for (col_idx, value) in row.iter().enumerate() {
            let unchanged = before.and_then(|r| r.get(col_idx)) == Some(value);
            if unchanged || matches!(value, CellValue::Empty) {
                continue;
            }
            apply_cell(worksheet, row_idx, col_idx, value);
            cells_written += 1;
        }
    }

    save_book(&book, path)?;
    Ok(cells_written)
}

/// Set a single cell; `row` and `col` are 0-based
fn apply_cell(worksheet: &mut Worksheet, row: usize, col: usize, value: &CellValue) {
    // Excel uses 1-based indexing
    let row_num = (row + 1) as u32;
    let col_num = (col + 1) as u32;

    let cell = worksheet.get_cell_mut((col_num, row_num));

    match value {
        CellValue::Empty => {
            cell.set_value("");
        }
        CellValue::String(s) => {
            cell.set_value_string(s);
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Boolean(b) => {
            cell.set_value_bool(*b);
        }
    }
}

fn save_book(book: &Spreadsheet, path: &Path) -> Result<()> {
    writer::xlsx::write(book, path).map_err(|e| {
        MarksError::Workbook(format!("Failed to save workbook {}: {}", path.display(), e))
    })
}

/// Create a timestamped copy of the file before editing
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(MarksError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }

    let backup_name = format!(
        "{}.backup.{}",
        path.display(),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    let backup_path = PathBuf::from(backup_name);

    std::fs::copy(path, &backup_path).map_err(|e| MarksError::io(&backup_path, e))?;
    tracing::debug!("Backed up {} to {}", path.display(), backup_path.display());

    Ok(backup_path)
}
