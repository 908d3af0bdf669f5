//! Editing session over a single store.
//!
//! The session owns the row cursor and any marks entered but not yet saved.
//! Saving and moving are separate steps: [`EditorSession::submit`] reports
//! whether there is a next student, and the caller decides whether to go
//! there.

use serde::{Deserialize, Serialize};

use crate::error::{MarksError, Result};
use crate::record::{Marks, StudentRecord};
use crate::store::MarksStore;

/// Derived values for staged marks, before they are saved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub total: f64,
    pub average: f64,
    pub scaled_average: f64,
    pub final_marks: f64,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Staged marks were written and the file saved
    Saved { row: usize, has_next: bool },
    /// Nothing was staged, so nothing was written
    Unchanged { row: usize, has_next: bool },
    /// The update or the save failed; staged marks are kept for a retry
    Failed(MarksError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Moved(StudentRecord),
    /// Staged marks must be submitted or discarded first
    UnsavedChanges,
    /// Already at the first or last data row
    AtBoundary,
}

pub struct EditorSession {
    store: MarksStore,
    cursor: usize,
    staged: Option<Marks>,
}

impl EditorSession {
    /// Start at the first data row
    pub fn new(store: MarksStore) -> Result<Self> {
        store.ensure_row(1)?;
        Ok(Self {
            store,
            cursor: 1,
            staged: None,
        })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn store(&self) -> &MarksStore {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.staged.is_some()
    }

    pub fn staged(&self) -> Option<&Marks> {
        self.staged.as_ref()
    }

    pub fn current(&self) -> Result<StudentRecord> {
        self.store.get_record(self.cursor)
    }

    pub fn has_previous(&self) -> bool {
        self.store.has_previous(self.cursor)
    }

    pub fn has_next(&self) -> bool {
        self.store.has_next(self.cursor)
    }

    /// Hold `marks` for the current row and return the values they produce
    pub fn stage(&mut self, marks: Marks) -> Result<Preview> {
        self.store.validator().check_input(&marks, self.cursor)?;

        let aat = match marks.aat {
            Some(aat) => aat,
            None => self.current()?.aat(),
        };
        let scale = self.store.config().average_scale;
        let record = StudentRecord::new("", "", marks.exams).with_aat(aat);

        self.staged = Some(marks);
        Ok(Preview {
            total: record.total(),
            average: record.average(),
            scaled_average: record.scaled_average(scale),
            final_marks: record.final_marks(scale),
        })
    }

    pub fn discard(&mut self) {
        self.staged = None;
    }

    /// Write staged marks for the current row and save the file
    pub fn submit(&mut self) -> SubmitOutcome {
        let row = self.cursor;
        let Some(marks) = self.staged else {
            return SubmitOutcome::Unchanged {
                row,
                has_next: self.has_next(),
            };
        };

        let result = self
            .store
            .update_marks(row, &marks)
            .and_then(|_| self.store.save());

        match result {
            Ok(()) => {
                self.staged = None;
                SubmitOutcome::Saved {
                    row,
                    has_next: self.has_next(),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to save row {}: {}", row, e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Move to the next row. The boundary is checked before staged marks,
    /// so the last row reports `AtBoundary` even with marks staged.
    pub fn next(&mut self) -> Result<Navigation> {
        if !self.has_next() {
            return Ok(Navigation::AtBoundary);
        }
        self.go_to(self.cursor + 1)
    }

    pub fn previous(&mut self) -> Result<Navigation> {
        if !self.has_previous() {
            return Ok(Navigation::AtBoundary);
        }
        self.go_to(self.cursor - 1)
    }

    /// Move the cursor to `row`. The cursor only moves when the target row
    /// reads cleanly.
    pub fn go_to(&mut self, row: usize) -> Result<Navigation> {
        if self.is_dirty() {
            return Ok(Navigation::UnsavedChanges);
        }
        let record = self.store.get_record(row)?;
        self.cursor = row;
        Ok(Navigation::Moved(record))
    }

    pub fn close(&mut self) {
        self.staged = None;
        self.store.close();
    }

    pub fn into_store(self) -> MarksStore {
        self.store
    }
}
