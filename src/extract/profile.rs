use crate::snapshot::TableSnapshot;
use serde::Serialize;

/// Rows examined when counting columns
const PROFILE_SCAN_ROWS: usize = 10;

const HEADER_HINTS: [&str; 4] = ["dept", "course", "instructor", "term"];
const INSTRUCTOR_RATING_HINTS: [&str; 4] = ["ins1", "ins2", "ins3", "instructor"];
const COURSE_RATING_HINTS: [&str; 4] = ["artsc", "course", "rating", "evaluation"];
const RESPONSE_COUNT_HINTS: [&str; 4] = ["invited", "responses", "number", "size"];

/// Structural summary of a located table, logged once per page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableProfile {
    /// Widest row among the leading rows
    pub total_columns: usize,

    /// Cell texts of the first leading row that mentions typical column titles
    pub detected_headers: Vec<String>,

    pub has_instructor_ratings: bool,
    pub has_course_ratings: bool,
    pub has_response_counts: bool,
}

impl TableProfile {
    pub fn analyze(table: &TableSnapshot) -> Self {
        let text = table.raw_text.to_lowercase();
        let mentions = |hints: &[&str]| hints.iter().any(|hint| text.contains(hint));

        let detected_headers = table
            .rows
            .iter()
            .take(3)
            .find(|row| {
                let joined = row.texts().join(" ").to_lowercase();
                HEADER_HINTS.iter().any(|hint| joined.contains(hint))
            })
            .map(|row| row.texts().iter().map(|t| t.to_string()).collect())
            .unwrap_or_default();

        Self {
            total_columns: table
                .rows
                .iter()
                .take(PROFILE_SCAN_ROWS)
                .map(|row| row.len())
                .max()
                .unwrap_or(0),
            detected_headers,
            has_instructor_ratings: mentions(&INSTRUCTOR_RATING_HINTS),
            has_course_ratings: mentions(&COURSE_RATING_HINTS),
            has_response_counts: mentions(&RESPONSE_COUNT_HINTS),
        }
    }
}
