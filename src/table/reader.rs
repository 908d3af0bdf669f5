use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::types::{CellValue, Row};
use crate::error::{MarksError, Result};

/// Rows of the first worksheet of a workbook
#[derive(Debug, Clone)]
pub struct SheetRows {
    pub sheet_name: String,
    pub rows: Vec<Row>,
}

/// Read every populated row of the first worksheet.
///
/// Rows run from 0 through the last populated row index; cells missing
/// inside that rectangle come back as `CellValue::Empty`.
pub fn read_first_sheet(path: &Path) -> Result<SheetRows> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| {
        MarksError::Workbook(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| MarksError::Format(format!("{} has no worksheets", path.display())))?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        MarksError::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e))
    })?;

    let rows = range_to_rows(&range);
    tracing::debug!(
        "Read {} rows from sheet '{}' of {}",
        rows.len(),
        sheet_name,
        path.display()
    );

    Ok(SheetRows { sheet_name, rows })
}

fn range_to_rows(range: &Range<Data>) -> Vec<Row> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row_idx| {
            (0..=last_col)
                .map(|col_idx| convert_cell_value(range.get_value((row_idx, col_idx))))
                .collect()
        })
        .collect()
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            // Dates are not marks; keep the serial so nothing is lost on export
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) => CellValue::String(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::String(format!("#{:?}", e)),
        },
    }
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| MarksError::io(path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| MarksError::io(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
