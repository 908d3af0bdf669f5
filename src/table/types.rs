use serde::{Deserialize, Serialize};

/// Number of exam columns every layout carries
pub const EXAM_COUNT: usize = 3;

/// Column holding the student's name
pub const NAME_COLUMN: usize = 0;

/// Column holding the student's USN
pub const USN_COLUMN: usize = 1;

/// Field names used in validation messages, in exam order
pub const EXAM_FIELDS: [&str; EXAM_COUNT] = ["Exam1", "Exam2", "Exam3"];

/// Represents a cell value with type information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for identity fields and exports
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.trim().to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Boolean(b) => b.to_string(),
        }
    }
}

/// One row of a table, in column order
pub type Row = Vec<CellValue>;

/// Cell at `col`, or an empty cell when the row is shorter
pub fn cell_at(row: &[CellValue], col: usize) -> &CellValue {
    row.get(col).unwrap_or(&EMPTY_CELL)
}

/// Column layout of a marks table.
///
/// Every layout starts with `name, usn, exam1, exam2, exam3`; the wider
/// layouts append derived columns that are rewritten on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `name, usn, exam1, exam2, exam3`
    Marks,
    /// `name, usn, exam1, exam2, exam3, total, average`
    Totals,
    /// `name, usn, exam1, exam2, exam3, aat, total, average, final`
    Final,
}

impl Schema {
    pub fn width(self) -> usize {
        self.headers().len()
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Schema::Marks => &["Name", "USN", "Exam1", "Exam2", "Exam3"],
            Schema::Totals => &["Name", "USN", "Exam1", "Exam2", "Exam3", "Total", "Average"],
            Schema::Final => &[
                "Name", "USN", "Exam1", "Exam2", "Exam3", "AAT", "Total", "Average", "Final",
            ],
        }
    }

    pub fn exam_column(self, index: usize) -> usize {
        2 + index
    }

    pub fn aat_column(self) -> Option<usize> {
        match self {
            Schema::Final => Some(5),
            _ => None,
        }
    }

    pub fn total_column(self) -> Option<usize> {
        match self {
            Schema::Marks => None,
            Schema::Totals => Some(5),
            Schema::Final => Some(6),
        }
    }

    pub fn average_column(self) -> Option<usize> {
        match self {
            Schema::Marks => None,
            Schema::Totals => Some(6),
            Schema::Final => Some(7),
        }
    }

    pub fn final_column(self) -> Option<usize> {
        match self {
            Schema::Final => Some(8),
            _ => None,
        }
    }

    pub fn column_name(self, col: usize) -> &'static str {
        self.headers().get(col).copied().unwrap_or("Column")
    }

    /// Layout whose width is exactly `width`
    pub fn from_width(width: usize) -> Option<Schema> {
        match width {
            5 => Some(Schema::Marks),
            7 => Some(Schema::Totals),
            9 => Some(Schema::Final),
            _ => None,
        }
    }

    /// Widest layout that fits in a header of `width` columns
    pub fn detect(width: usize) -> Schema {
        if width >= 9 {
            Schema::Final
        } else if width >= 7 {
            Schema::Totals
        } else {
            Schema::Marks
        }
    }

    /// Layout named by a header row.
    ///
    /// The widest layout whose column names lead the header wins (case and
    /// surrounding spaces ignored); columns after it are left alone. Headers
    /// that name no layout fall back to the width up to the last non-empty
    /// header cell.
    pub fn from_header(header: &[CellValue]) -> Schema {
        let named = [Schema::Final, Schema::Totals, Schema::Marks]
            .into_iter()
            .find(|schema| schema.names_lead(header));
        if let Some(schema) = named {
            return schema;
        }

        let width = header
            .iter()
            .rposition(|cell| !cell.is_empty())
            .map_or(0, |last| last + 1);
        let schema = Schema::detect(width);
        tracing::warn!(
            "Header names match no known layout; using {:?} from its width of {}",
            schema,
            width
        );
        schema
    }

    fn names_lead(self, header: &[CellValue]) -> bool {
        self.headers()
            .iter()
            .enumerate()
            .all(|(col, name)| cell_at(header, col).as_text().eq_ignore_ascii_case(name))
    }
}

/// Supported field delimiters for text tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
    Semicolon,
}

impl Delimiter {
    /// Get the character for this delimiter
    pub fn char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
            Delimiter::Semicolon => ';',
        }
    }

    /// Detect delimiter from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "tsv" => Delimiter::Tab,
            "psv" => Delimiter::Pipe,
            _ => Delimiter::Comma,
        }
    }
}

/// Backing format of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Workbook,
    Delimited,
}
