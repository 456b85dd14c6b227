//! Content patterns shared by the schema inferencer and the row validator

use crate::config::ExtractionConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Course code as it appears in a data cell (`CSC108`, `MAT137Y1`)
static STRICT_COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}\d+[A-Z]?\d?$").expect("valid course code regex"));

/// Course or item code with an optional trailing qualifier (`CSC108H1`, `ENG100`)
static COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,5}\d+[A-Z]?\d*$").expect("valid course code regex"));

/// Short department or division code (`CSC`, `ANT`)
static DEPARTMENT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,5}$").expect("valid department regex"));

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'\-.]+$").expect("valid name regex"));

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\d*$").expect("valid numeric regex"));

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("valid decimal regex"));

/// Configured word lists, normalized once for matching
#[derive(Debug, Clone)]
pub struct Vocabulary {
    header_keywords: Vec<String>,
    header_indicators: Vec<String>,
    department_prefixes: Vec<String>,
    term_names: Vec<String>,
}

impl Vocabulary {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            header_keywords: lowercase_all(&config.header_keywords),
            header_indicators: lowercase_all(&config.header_indicators),
            department_prefixes: config
                .department_prefixes
                .iter()
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty())
                .collect(),
            term_names: config
                .term_names
                .iter()
                .map(|t| t.trim().to_string())
                .collect(),
        }
    }

    /// True if the text contains any header keyword (case-insensitive substring)
    pub fn contains_header_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.header_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// True if the whole text is exactly a header indicator word
    pub fn is_header_indicator(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        !lower.is_empty() && self.header_indicators.iter().any(|k| *k == lower)
    }

    /// True if the text contains any header indicator word
    pub fn contains_header_indicator(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.header_indicators
            .iter()
            .any(|k| lower.contains(k.as_str()))
    }

    pub fn is_term_name(&self, text: &str) -> bool {
        let text = text.trim();
        self.term_names.iter().any(|t| t.eq_ignore_ascii_case(text))
    }

    /// A cell that carries a department prefix and a digit is course data, never a header
    pub fn looks_like_course_data(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        text.chars().any(|c| c.is_ascii_digit())
            && self
                .department_prefixes
                .iter()
                .any(|p| upper.contains(p.as_str()))
    }

    /// Code-like tokens, pure numbers and term names look like data rather than headers
    pub fn looks_like_data(&self, text: &str) -> bool {
        let text = text.trim();
        STRICT_COURSE_CODE.is_match(text) || is_integer(text) || DECIMAL.is_match(text)
            || self.is_term_name(text)
    }

    /// Numeric cell or a member of the term enumeration
    pub fn is_numeric_or_term(&self, text: &str) -> bool {
        let text = text.trim();
        NUMERIC.is_match(text) || self.is_term_name(text)
    }
}

pub fn is_department_code(text: &str) -> bool {
    DEPARTMENT_CODE.is_match(text.trim())
}

pub fn is_course_code(text: &str) -> bool {
    COURSE_CODE.is_match(text.trim())
}

pub fn is_person_name(text: &str) -> bool {
    let text = text.trim();
    text.len() > 2 && PERSON_NAME.is_match(text)
}

pub fn is_integer(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
