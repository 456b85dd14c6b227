//! Table extraction
//!
//! This module turns a [`PageSnapshot`] into validated records:
//!
//! - [`TableLocator`] picks the data table among layout and navigation tables
//! - [`SchemaInferencer`] names the columns of that table
//! - [`RowValidator`] accepts rows that carry real data and rejects repeated headers
//! - [`fingerprint`] condenses a page's records into a content hash for stall detection
//!
//! Every step is a pure function of the snapshot and the extraction configuration.

mod fingerprint;
mod locator;
mod profile;
mod schema;
mod validator;
mod vocabulary;

pub use fingerprint::{fingerprint, is_repeat, Fingerprint};
pub use locator::{TableAssessment, TableLocator};
pub use profile::TableProfile;
pub use schema::{InferredSchema, SchemaInferencer, SchemaSource};
pub use validator::{Rejection, RowValidator};
pub use vocabulary::Vocabulary;

use crate::config::ExtractionConfig;
use crate::snapshot::PageSnapshot;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Separator between the values of one record in its canonical form
pub const UNIT_SEPARATOR: char = '\u{1f}';

/// Separator between records when hashing a page
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Column names of a table, in column order
///
/// Names are not necessarily unique. Columns without a usable name are called `Column_N`
/// where N is the 1-based column position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub column_names: Vec<String>,
}

impl Schema {
    pub fn new(column_names: Vec<String>) -> Self {
        Self { column_names }
    }

    /// `Column_1..Column_width`
    pub fn synthetic(width: usize) -> Self {
        Self::new((0..width).map(placeholder_name).collect())
    }

    pub fn len(&self) -> usize {
        self.column_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty()
    }

    /// Extends the schema with placeholders until it has at least `width` columns
    pub fn pad_to(&mut self, width: usize) {
        while self.column_names.len() < width {
            let position = self.column_names.len();
            self.column_names.push(placeholder_name(position));
        }
    }

    /// Name of the column at `index`, or its placeholder when the schema is narrower
    pub fn column_name(&self, index: usize) -> String {
        self.column_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| placeholder_name(index))
    }
}

/// Placeholder name for the column at zero-based `index`
pub fn placeholder_name(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// One validated row: ordered `(column, value)` pairs
///
/// Pairs keep the schema's column order, and repeated column names are kept side by side so
/// that no cell is lost. Serialized as a JSON object whose keys appear in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Builds a record from parallel column and value lists
    pub fn from_columns<C, V>(columns: &[C], values: &[V]) -> Self
    where
        C: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(
            columns
                .iter()
                .zip(values)
                .map(|(c, v)| (c.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Cell values in column order joined by [`UNIT_SEPARATOR`]
    pub fn canonical_form(&self) -> String {
        let mut canonical = String::new();
        for (i, value) in self.values().enumerate() {
            if i > 0 {
                canonical.push(UNIT_SEPARATOR);
            }
            canonical.push_str(value);
        }
        canonical
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to cell text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((column, value)) = access.next_entry::<String, String>()? {
                    fields.push((column, value));
                }
                Ok(Record::new(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// Index of the located table within the snapshot, None if no table qualified
    pub table_index: Option<usize>,

    pub schema: Option<InferredSchema>,

    pub profile: Option<TableProfile>,

    /// Accepted rows in table order
    pub records: Vec<Record>,

    /// Rows turned down by the validator
    pub rejected: usize,
}

impl PageExtraction {
    pub fn table_found(&self) -> bool {
        self.table_index.is_some()
    }
}

/// Locator, inferencer and validator bundled for one configuration
#[derive(Debug, Clone)]
pub struct Extractor {
    locator: TableLocator,
    inferencer: SchemaInferencer,
    validator: RowValidator,
}

impl Extractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        let vocabulary = Vocabulary::from_config(config);
        Self {
            locator: TableLocator::new(config),
            inferencer: SchemaInferencer::new(vocabulary.clone(), config.fallback_columns.clone()),
            validator: RowValidator::new(vocabulary, config.accept_threshold),
        }
    }

    pub fn locator(&self) -> &TableLocator {
        &self.locator
    }

    /// Runs locate, infer and validate over a snapshot
    ///
    /// A page without a qualifying table yields an extraction with no table and no records.
    pub fn extract(&self, snapshot: &PageSnapshot) -> PageExtraction {
        let Some((table_index, table)) = self.locator.locate(snapshot) else {
            return PageExtraction::default();
        };

        let inferred = self.inferencer.infer(table);
        let profile = TableProfile::analyze(table);
        let first_data_row = inferred.header_row.map(|i| i + 1).unwrap_or(0);

        let mut records = Vec::new();
        let mut rejected = 0;
        for row in table.rows.iter().skip(first_data_row) {
            if row.is_empty() || row.is_header_only() {
                continue;
            }
            match self.validator.validate(row, &inferred.schema) {
                Ok(record) => records.push(record),
                Err(rejection) => {
                    debug!("Rejected row {:?}: {}", row.texts(), rejection);
                    rejected += 1;
                }
            }
        }

        PageExtraction {
            table_index: Some(table_index),
            schema: Some(inferred),
            profile: Some(profile),
            records,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RowSnapshot, TableSnapshot};

    fn evaluation_table() -> TableSnapshot {
        TableSnapshot::from_rows(vec![
            RowSnapshot::header(&["Dept", "Course", "Last Name", "First Name", "Term", "INS1"]),
            RowSnapshot::data(&["CSC", "CSC108H1", "Smith", "Alice", "Fall", "4.2"]),
            RowSnapshot::data(&["MAT", "MAT137Y1", "Jones", "Bob", "Winter", "3.9"]),
            RowSnapshot::data(&["Dept", "Course", "Last Name", "First Name", "Term", "INS1"]),
            RowSnapshot::data(&["ANT", "ANT100Y1", "Nguyen", "Chris", "Fall", "4.5"]),
            RowSnapshot::data(&["", "", "", "", "", ""]),
        ])
    }

    #[test]
    fn test_schema_padding() {
        let mut schema = Schema::new(vec!["Dept".to_string()]);
        schema.pad_to(3);
        assert_eq!(schema.column_names, vec!["Dept", "Column_2", "Column_3"]);

        schema.pad_to(1);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.column_name(5), "Column_6");
    }

    #[test]
    fn test_record_keeps_duplicate_columns() {
        let record = Record::from_columns(&["Name", "Name"], &["Smith", "Alice"]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("Name"), Some("Smith"));
        assert_eq!(record.canonical_form(), "Smith\u{1f}Alice");
    }

    #[test]
    fn test_record_json_preserves_column_order() {
        let record = Record::from_columns(&["Term", "Dept"], &["Fall", "CSC"]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Term":"Fall","Dept":"CSC"}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_extract_skips_header_and_rejects_repeats() {
        let extractor = Extractor::new(&ExtractionConfig::default());
        let snapshot = PageSnapshot::new(vec![evaluation_table()]);

        let extraction = extractor.extract(&snapshot);

        assert!(extraction.table_found());
        assert_eq!(
            extraction.schema.as_ref().map(|s| s.source),
            Some(SchemaSource::ExplicitHeaderRow)
        );
        assert_eq!(extraction.records.len(), 3);
        assert_eq!(extraction.rejected, 2);
        assert_eq!(extraction.records[0].get("Course"), Some("CSC108H1"));
        assert_eq!(extraction.records[2].get("Last Name"), Some("Nguyen"));
    }

    #[test]
    fn test_extract_without_table() {
        let extractor = Extractor::new(&ExtractionConfig::default());
        let extraction = extractor.extract(&PageSnapshot::empty());

        assert!(!extraction.table_found());
        assert!(extraction.records.is_empty());
    }
}
