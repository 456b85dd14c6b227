//! Structural page captures
//!
//! A [`PageSnapshot`] is an immutable view of one rendered page: every table it holds, each
//! as rows of text cells. Snapshots are produced fresh on every page load and discarded once
//! the page has been extracted.

mod html;

pub use html::parse_snapshot;

use chrono::{DateTime, Utc};

/// Whether a cell was rendered as a header cell (`<th>`) or a data cell (`<td>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Header,
    Data,
}

/// One cell of a table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSnapshot {
    pub text: String,
    pub kind: CellKind,
}

impl CellSnapshot {
    pub fn data(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CellKind::Data,
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CellKind::Header,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One row of a table. It has no identity beyond its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSnapshot {
    pub cells: Vec<CellSnapshot>,
}

impl RowSnapshot {
    pub fn new(cells: Vec<CellSnapshot>) -> Self {
        Self { cells }
    }

    /// Builds a row of data cells
    pub fn data<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(texts.iter().map(|t| CellSnapshot::data(t.as_ref())).collect())
    }

    /// Builds a row of header cells
    pub fn header<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| CellSnapshot::header(t.as_ref()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if at least one cell was rendered as a header cell
    pub fn has_header_cells(&self) -> bool {
        self.cells.iter().any(|c| c.kind == CellKind::Header)
    }

    /// True if the row has cells and every one of them is a header cell
    pub fn is_header_only(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.kind == CellKind::Header)
    }

    /// True if every cell is blank
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellSnapshot::is_empty)
    }

    /// Trimmed cell texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.trim()).collect()
    }
}

/// A candidate data source: one table on the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    pub rows: Vec<RowSnapshot>,

    /// Full concatenated text of the table, used for content sniffing
    pub raw_text: String,
}

impl TableSnapshot {
    /// Builds a table and derives its raw text from the rows
    pub fn from_rows(rows: Vec<RowSnapshot>) -> Self {
        let raw_text = rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self { rows, raw_text }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the table
    pub fn max_cells(&self) -> usize {
        self.rows.iter().map(RowSnapshot::len).max().unwrap_or(0)
    }
}

/// Immutable capture of one rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub tables: Vec<TableSnapshot>,
    pub retrieved_at: DateTime<Utc>,
}

impl PageSnapshot {
    pub fn new(tables: Vec<TableSnapshot>) -> Self {
        Self {
            tables,
            retrieved_at: Utc::now(),
        }
    }

    /// A page without any table
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_text_joins_cells_and_rows() {
        let table = TableSnapshot::from_rows(vec![
            RowSnapshot::header(&["Dept", "Course"]),
            RowSnapshot::data(&["CSC", "CSC108H1"]),
        ]);
        assert_eq!(table.raw_text, "Dept\tCourse\nCSC\tCSC108H1");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.max_cells(), 2);
    }

    #[test]
    fn test_row_classification() {
        let header = RowSnapshot::header(&["Dept", ""]);
        assert!(header.has_header_cells());
        assert!(header.is_header_only());
        assert!(!header.is_blank());

        let blank = RowSnapshot::data(&["", "  "]);
        assert!(blank.is_blank());
        assert!(!blank.has_header_cells());

        let mixed = RowSnapshot::new(vec![CellSnapshot::header("Dept"), CellSnapshot::data("CSC")]);
        assert!(mixed.has_header_cells());
        assert!(!mixed.is_header_only());
    }

    #[test]
    fn test_empty_table() {
        let table = TableSnapshot::from_rows(vec![]);
        assert_eq!(table.max_cells(), 0);
        assert_eq!(table.raw_text, "");
        assert!(PageSnapshot::empty().tables.is_empty());
    }
}
