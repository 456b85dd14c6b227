//! Column schema inference
//!
//! Strategies are tried in a fixed order and the first one that produces a schema wins:
//!
//! 1. `explicit-header-row`: a row rendered with header cells
//! 2. `header-keyword-row`: a data row whose cells read like column titles
//! 3. `positional`: `Column_1..Column_N` sized by the widest leading row
//!
//! Whatever the strategy, the schema is padded to the widest row of the table so that no
//! cell is ever dropped.

use crate::extract::vocabulary::{is_integer, Vocabulary};
use crate::extract::{placeholder_name, Schema};
use crate::snapshot::{CellKind, RowSnapshot, TableSnapshot};
use std::fmt;
use tracing::debug;

/// Rows examined when looking for a header row
const HEADER_SCAN_ROWS: usize = 3;

/// Rows examined when sizing a positional schema
const POSITIONAL_SCAN_ROWS: usize = 5;

/// Minimum keyword hits for a data row to pass as a header
const MIN_KEYWORD_HITS: usize = 2;

/// Minimum column count for a data row to pass as a header
const MIN_KEYWORD_ROW_WIDTH: usize = 5;

/// Words that mark a leading row as a header when no strategy named the columns
const POSITIONAL_HEADER_HINTS: [&str; 4] = ["dept", "course", "instructor", "term"];

/// Which strategy produced a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaSource {
    ExplicitHeaderRow,
    HeaderKeywordRow,
    Positional,
    /// The table had no cells in its leading rows; configured fallback columns were used
    Fallback,
}

impl SchemaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaSource::ExplicitHeaderRow => "explicit-header-row",
            SchemaSource::HeaderKeywordRow => "header-keyword-row",
            SchemaSource::Positional => "positional",
            SchemaSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredSchema {
    pub schema: Schema,
    pub source: SchemaSource,

    /// Index of the row that held the column names; data rows start after it
    pub header_row: Option<usize>,
}

/// Output of a single strategy before padding
struct Candidate {
    column_names: Vec<String>,
    header_row: Option<usize>,
    source: SchemaSource,
}

type StrategyFn = fn(&TableSnapshot, &SchemaInferencer) -> Option<Candidate>;

struct NamedStrategy {
    name: &'static str,
    run: StrategyFn,
}

const STRATEGIES: [NamedStrategy; 3] = [
    NamedStrategy {
        name: "explicit-header-row",
        run: explicit_header_row,
    },
    NamedStrategy {
        name: "header-keyword-row",
        run: header_keyword_row,
    },
    NamedStrategy {
        name: "positional",
        run: positional,
    },
];

/// Names the columns of a located table
#[derive(Debug, Clone)]
pub struct SchemaInferencer {
    vocabulary: Vocabulary,
    fallback_columns: Vec<String>,
}

impl SchemaInferencer {
    pub fn new(vocabulary: Vocabulary, fallback_columns: Vec<String>) -> Self {
        Self {
            vocabulary,
            fallback_columns,
        }
    }

    /// Infers a schema for the table
    ///
    /// Never fails: when no strategy applies the configured fallback columns are used. The
    /// returned schema has at least as many columns as the widest row of the table.
    pub fn infer(&self, table: &TableSnapshot) -> InferredSchema {
        let candidate = STRATEGIES
            .iter()
            .find_map(|strategy| {
                let candidate = (strategy.run)(table, self)?;
                debug!(
                    "Schema strategy {} matched with {} columns",
                    strategy.name,
                    candidate.column_names.len()
                );
                Some(candidate)
            })
            .unwrap_or_else(|| Candidate {
                column_names: self.fallback_columns.clone(),
                header_row: None,
                source: SchemaSource::Fallback,
            });

        let mut schema = Schema::new(candidate.column_names);
        schema.pad_to(table.max_cells());

        InferredSchema {
            schema,
            source: candidate.source,
            header_row: candidate.header_row,
        }
    }

    /// Index of the row holding the column names, if any
    pub fn header_row_index(&self, table: &TableSnapshot) -> Option<usize> {
        self.infer(table).header_row
    }
}

/// First of the leading rows rendered with at least one non-empty header cell
fn explicit_header_row(table: &TableSnapshot, _: &SchemaInferencer) -> Option<Candidate> {
    table
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(index, row)| {
            let header_cells: Vec<&str> = row
                .cells
                .iter()
                .filter(|c| c.kind == CellKind::Header)
                .map(|c| c.text.trim())
                .collect();

            if header_cells.iter().all(|t| t.is_empty()) {
                return None;
            }

            let column_names = header_cells
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    if text.is_empty() {
                        placeholder_name(i)
                    } else {
                        text.to_string()
                    }
                })
                .collect();

            Some(Candidate {
                column_names,
                header_row: Some(index),
                source: SchemaSource::ExplicitHeaderRow,
            })
        })
}

/// First of the leading data rows whose cells read like column titles
fn header_keyword_row(table: &TableSnapshot, inferencer: &SchemaInferencer) -> Option<Candidate> {
    table
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(index, row)| {
            let column_names = keyword_row_names(row, &inferencer.vocabulary)?;
            Some(Candidate {
                column_names,
                header_row: Some(index),
                source: SchemaSource::HeaderKeywordRow,
            })
        })
}

fn keyword_row_names(row: &RowSnapshot, vocabulary: &Vocabulary) -> Option<Vec<String>> {
    let mut names = Vec::with_capacity(row.len());
    let mut keyword_hits = 0;

    for text in row.texts() {
        if vocabulary.looks_like_course_data(text) {
            return None;
        }

        if vocabulary.contains_header_keyword(text) {
            keyword_hits += 1;
            names.push(text.to_string());
        } else if !text.is_empty()
            && !is_integer(text)
            && text.chars().count() > 1
            && !vocabulary.looks_like_data(text)
        {
            names.push(text.to_string());
        } else {
            names.push(placeholder_name(names.len()));
        }
    }

    (keyword_hits >= MIN_KEYWORD_HITS && names.len() >= MIN_KEYWORD_ROW_WIDTH).then_some(names)
}

/// `Column_1..Column_N` where N is the widest of the leading rows
fn positional(table: &TableSnapshot, inferencer: &SchemaInferencer) -> Option<Candidate> {
    let width = table
        .rows
        .iter()
        .take(POSITIONAL_SCAN_ROWS)
        .map(RowSnapshot::len)
        .max()
        .unwrap_or(0);

    if width == 0 {
        return None;
    }

    Some(Candidate {
        column_names: Schema::synthetic(width).column_names,
        header_row: leading_header_like_row(table, &inferencer.vocabulary),
        source: SchemaSource::Positional,
    })
}

/// A leading row mentioning typical column titles and carrying no course data
fn leading_header_like_row(table: &TableSnapshot, vocabulary: &Vocabulary) -> Option<usize> {
    table
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let texts = row.texts();
            let joined = texts.join(" ").to_lowercase();
            POSITIONAL_HEADER_HINTS.iter().any(|hint| joined.contains(hint))
                && !texts.iter().any(|t| vocabulary.looks_like_course_data(t))
        })
}
