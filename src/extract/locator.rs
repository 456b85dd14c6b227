use crate::config::ExtractionConfig;
use crate::snapshot::{PageSnapshot, TableSnapshot};

/// How a single table measures up against the locator's criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAssessment {
    pub row_count: usize,

    /// Configured markers found in the table text
    pub matched_markers: Vec<String>,

    /// True if the table has more rows than the minimum and at least one marker matched
    pub qualifies: bool,
}

/// Picks the data table among all tables of a page
///
/// A table qualifies when it has strictly more rows than the configured minimum and its text
/// contains at least one content marker. An empty marker list accepts any substantial table.
#[derive(Debug, Clone)]
pub struct TableLocator {
    content_markers: Vec<String>,
    min_rows: usize,
}

impl TableLocator {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self::with_markers(config.content_markers.clone(), config.min_table_rows)
    }

    pub fn with_markers(content_markers: Vec<String>, min_rows: usize) -> Self {
        Self {
            content_markers,
            min_rows,
        }
    }

    /// Same markers, different row minimum
    pub fn with_min_rows(&self, min_rows: usize) -> Self {
        Self::with_markers(self.content_markers.clone(), min_rows)
    }

    pub fn score(&self, table: &TableSnapshot) -> TableAssessment {
        let row_count = table.row_count();
        let matched_markers: Vec<String> = self
            .content_markers
            .iter()
            .filter(|marker| table.raw_text.contains(marker.as_str()))
            .cloned()
            .collect();

        let has_content = self.content_markers.is_empty() || !matched_markers.is_empty();

        TableAssessment {
            row_count,
            matched_markers,
            qualifies: row_count > self.min_rows && has_content,
        }
    }

    /// Returns the first qualifying table in document order with its index
    pub fn locate<'s>(&self, snapshot: &'s PageSnapshot) -> Option<(usize, &'s TableSnapshot)> {
        snapshot
            .tables
            .iter()
            .enumerate()
            .find(|(_, table)| self.score(table).qualifies)
    }
}
