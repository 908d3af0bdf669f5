//! Data access for a student marks editor.
//!
//! A [`MarksStore`] loads a marks table from an `.xlsx` workbook or a
//! delimited text file, decodes rows into [`StudentRecord`]s, applies mark
//! updates with their derived columns and saves back to the same file.
//! [`EditorSession`] adds the row cursor of an editing screen and
//! [`MarksWorker`] runs a session off the async runtime.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod session;
pub mod store;
pub mod table;
pub mod worker;

pub use cli::run;
pub use config::{MarkRange, Strictness, StoreConfig};
pub use error::{MarksError, Result};
pub use record::{AverageScale, Marks, StudentRecord};
pub use session::{EditorSession, Navigation, Preview, SubmitOutcome};
pub use store::{ClassSummary, MarksStore};
pub use table::{CellValue, Delimiter, Schema, SourceKind, TabularSource, ValidationReport};
pub use worker::MarksWorker;
