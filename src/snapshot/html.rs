//! HTML parser producing page snapshots
//!
//! Every `<table>` in the document becomes a [`TableSnapshot`] in document order. Rows of a
//! nested table belong to the nested table only, never to the table that contains it.

use crate::snapshot::{CellSnapshot, PageSnapshot, RowSnapshot, TableSnapshot};
use scraper::{ElementRef, Html, Selector};

/// Parses an HTML document into a page snapshot
///
/// # Example
///
/// ```
/// use tablesweep::snapshot::parse_snapshot;
///
/// let html = "<table><tr><th>Dept</th></tr><tr><td>CSC</td></tr></table>";
/// let snapshot = parse_snapshot(html);
/// assert_eq!(snapshot.tables.len(), 1);
/// assert_eq!(snapshot.tables[0].rows.len(), 2);
/// ```
pub fn parse_snapshot(html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);
    PageSnapshot::new(extract_tables(&document))
}

/// Extracts all tables from the document in document order
fn extract_tables(document: &Html) -> Vec<TableSnapshot> {
    let (Ok(table_selector), Ok(row_selector)) = (Selector::parse("table"), Selector::parse("tr"))
    else {
        return Vec::new();
    };

    document
        .select(&table_selector)
        .map(|table| {
            let rows = table
                .select(&row_selector)
                .filter(|row| belongs_to(row, &table))
                .map(extract_row)
                .collect();
            TableSnapshot::from_rows(rows)
        })
        .collect()
}

/// True if `table` is the closest `<table>` ancestor of `row`
fn belongs_to(row: &ElementRef, table: &ElementRef) -> bool {
    row.ancestors()
        .find(|node| {
            node.value()
                .as_element()
                .map(|el| el.name() == "table")
                .unwrap_or(false)
        })
        .map(|node| node.id() == table.id())
        .unwrap_or(false)
}

/// Extracts the direct `<th>`/`<td>` cells of a row
fn extract_row(row: ElementRef) -> RowSnapshot {
    let cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| {
            let text = cell_text(&cell);
            match cell.value().name() {
                "th" => Some(CellSnapshot::header(text)),
                "td" => Some(CellSnapshot::data(text)),
                _ => None,
            }
        })
        .collect();
    RowSnapshot::new(cells)
}

/// Collapses the text content of a cell into single-spaced, trimmed text
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
