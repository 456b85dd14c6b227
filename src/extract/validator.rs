use crate::extract::vocabulary::{
    is_course_code, is_department_code, is_person_name, Vocabulary,
};
use crate::extract::{Record, Schema};
use crate::snapshot::RowSnapshot;
use std::fmt;

/// Non-empty cells needed before the structural acceptance path applies
const FALLBACK_MIN_CELLS: usize = 5;

/// Numeric or term cells that earn a point on the primary path
const MIN_NUMERIC_CELLS: usize = 3;

/// Why a row was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Every cell is blank
    Empty,

    /// A key field carries a column title; the row is a repeated header or a footer
    HeaderRepeat,

    /// Neither the content score nor the structural check was convincing
    LowScore { score: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty row"),
            Rejection::HeaderRepeat => write!(f, "repeated header"),
            Rejection::LowScore { score } => write!(f, "low score ({})", score),
        }
    }
}

/// Field roles a row is scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Department,
    Course,
    Name,
}

impl Role {
    fn of_column(column: &str) -> Option<Role> {
        let lower = column.to_lowercase();
        if lower.contains("dept") || lower.contains("department") {
            Some(Role::Department)
        } else if lower.contains("course") || lower.contains("subject") {
            Some(Role::Course)
        } else if lower.contains("name") || lower.contains("instructor") {
            Some(Role::Name)
        } else {
            None
        }
    }
}

/// The department, course and name fields of a row, when present
#[derive(Debug, Default)]
struct KeyFields<'a> {
    department: Option<&'a str>,
    course: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> KeyFields<'a> {
    /// Finds key fields by column name, then by content for roles no column names
    fn locate(record: &'a Record) -> Self {
        let mut fields = KeyFields::default();

        for (column, value) in record.fields() {
            let slot = match Role::of_column(column) {
                Some(Role::Department) => &mut fields.department,
                Some(Role::Course) => &mut fields.course,
                Some(Role::Name) => &mut fields.name,
                None => continue,
            };
            if slot.is_none() {
                *slot = Some(value.as_str());
            }
        }

        let values: Vec<&str> = record.values().map(str::trim).collect();
        if fields.department.is_none() {
            fields.department = values.iter().copied().find(|v| is_department_code(v));
        }
        if fields.course.is_none() {
            fields.course = values.iter().copied().find(|v| is_course_code(v));
        }
        if fields.name.is_none() {
            fields.name = values
                .iter()
                .copied()
                .find(|v| is_person_name(v) && !is_department_code(v));
        }

        fields
    }

    fn iter(&self) -> impl Iterator<Item = &'a str> {
        [self.department, self.course, self.name].into_iter().flatten()
    }
}

/// Decides whether a row is a genuine data row
#[derive(Debug, Clone)]
pub struct RowValidator {
    vocabulary: Vocabulary,
    accept_threshold: u32,
}

impl RowValidator {
    pub fn new(vocabulary: Vocabulary, accept_threshold: u32) -> Self {
        Self {
            vocabulary,
            accept_threshold,
        }
    }

    /// Validates a row against a schema
    ///
    /// # Arguments
    ///
    /// * `row` - The row to classify
    /// * `schema` - Column names; cells beyond the schema get placeholder names and missing
    ///   trailing cells become `""`
    ///
    /// # Returns
    ///
    /// * `Ok(Record)` - The row holds data
    /// * `Err(Rejection)` - The row is blank, a stray header, or unconvincing
    pub fn validate(&self, row: &RowSnapshot, schema: &Schema) -> Result<Record, Rejection> {
        if row.is_blank() {
            return Err(Rejection::Empty);
        }

        let texts = row.texts();
        let width = schema.len().max(texts.len());
        let record = Record::new(
            (0..width)
                .map(|i| {
                    let value = texts.get(i).copied().unwrap_or("");
                    (schema.column_name(i), value.to_string())
                })
                .collect(),
        );

        let key_fields = KeyFields::locate(&record);
        if key_fields
            .iter()
            .any(|value| self.vocabulary.is_header_indicator(value))
        {
            return Err(Rejection::HeaderRepeat);
        }

        let score = self.score(&key_fields, &texts);
        if score >= self.accept_threshold || self.passes_structural_check(&texts) {
            Ok(record)
        } else {
            Err(Rejection::LowScore { score })
        }
    }

    fn score(&self, key_fields: &KeyFields, texts: &[&str]) -> u32 {
        let mut score = 0;

        if key_fields.department.is_some_and(is_department_code) {
            score += 1;
        }
        if key_fields.course.is_some_and(is_course_code) {
            score += 2;
        }
        if key_fields.name.is_some_and(is_person_name) {
            score += 1;
        }

        let numeric_cells = texts
            .iter()
            .filter(|t| self.vocabulary.is_numeric_or_term(t))
            .count();
        if numeric_cells >= MIN_NUMERIC_CELLS {
            score += 1;
        }

        score
    }

    /// Enough filled cells and few of them reading like column titles
    fn passes_structural_check(&self, texts: &[&str]) -> bool {
        let filled: Vec<&&str> = texts.iter().filter(|t| !t.is_empty()).collect();
        if filled.len() < FALLBACK_MIN_CELLS {
            return false;
        }

        let header_like = filled
            .iter()
            .filter(|t| self.vocabulary.contains_header_indicator(t))
            .count();

        // Fewer than 30% of the filled cells
        header_like * 10 < filled.len() * 3
    }
}
