use std::path::Path;

use super::delimited::DelimitedSource;
use super::types::{Delimiter, Row, SourceKind};
use super::workbook::WorkbookSource;
use crate::config::StoreConfig;
use crate::error::{MarksError, Result};

/// A file that can be read into rows and written back.
///
/// Adapters only parse and serialize; row addressing, validation and the
/// derived columns live in the store.
pub trait TabularSource: Send {
    fn kind(&self) -> SourceKind;

    fn path(&self) -> &Path;

    /// Read every row, header included
    fn load(&mut self) -> Result<Vec<Row>>;

    /// Replace the file's contents with `rows`
    fn persist(&mut self, rows: &[Row]) -> Result<()>;

    /// Drop anything held between calls
    fn release(&mut self) {}
}

/// Pick an adapter from the file extension
pub fn open_source(path: &Path, config: &StoreConfig) -> Result<Box<dyn TabularSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" => Ok(Box::new(WorkbookSource::new(path))),
        "csv" | "tsv" | "psv" | "txt" => {
            let delimiter = config
                .delimiter
                .unwrap_or_else(|| Delimiter::from_extension(&ext));
            Ok(Box::new(DelimitedSource::new(
                path,
                delimiter,
                config.schema,
                config.decimal_places,
            )))
        }
        _ => Err(MarksError::UnsupportedFormat(path.display().to_string())),
    }
}
