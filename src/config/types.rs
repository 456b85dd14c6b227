use serde::Deserialize;

/// Main configuration structure for Tablesweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    pub output: OutputConfig,
}

/// Where the report pages come from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the first report page
    pub url: String,

    /// Query parameter carrying the page number for pages after the first
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selector of the "next page" control; its absence means the last page
    #[serde(rename = "next-selector", default)]
    pub next_selector: Option<String>,

    /// Regex with one capture group holding the total page count (e.g. `/ (\d+)`)
    #[serde(rename = "total-pages-pattern", default)]
    pub total_pages_pattern: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Heuristics used to find the data table, name its columns and accept rows
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strings expected somewhere in a genuine data table
    #[serde(rename = "content-markers")]
    pub content_markers: Vec<String>,

    /// A table must have strictly more rows than this to qualify
    #[serde(rename = "min-table-rows")]
    pub min_table_rows: usize,

    /// Words that mark a row as a header row
    #[serde(rename = "header-keywords")]
    pub header_keywords: Vec<String>,

    /// Words that mark a validated row as a stray header or footer repeat
    #[serde(rename = "header-indicators")]
    pub header_indicators: Vec<String>,

    /// Department prefixes that make a cell look like data, not a header
    #[serde(rename = "department-prefixes")]
    pub department_prefixes: Vec<String>,

    /// Closed enumeration of term names
    #[serde(rename = "term-names")]
    pub term_names: Vec<String>,

    /// Schema used when a table has no cells at all in its leading rows
    #[serde(rename = "fallback-columns")]
    pub fallback_columns: Vec<String>,

    /// Minimum validity score for a row to be accepted on the primary path
    #[serde(rename = "accept-threshold")]
    pub accept_threshold: u32,
}

/// Pagination limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Consecutive stalls that end the session
    #[serde(rename = "stall-threshold")]
    pub stall_threshold: u32,

    /// Consecutive failed navigations that end the session
    #[serde(rename = "navigation-failure-threshold")]
    pub navigation_failure_threshold: u32,

    /// Safety ceiling on pages visited in one session
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Retries for a failing page fetch before the session fails
    #[serde(rename = "fetch-retries")]
    pub fetch_retries: u32,

    /// Retries for a failing navigation before it counts as a stall
    #[serde(rename = "navigation-retries")]
    pub navigation_retries: u32,

    /// Pause between retries (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

/// Polling parameters for waiting on dynamic content
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Number of polls before giving up on readiness
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause between polls (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// The page is ready once a table with more rows than this holds a content marker
    #[serde(rename = "min-rows")]
    pub min_rows: usize,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_user_agent() -> String {
    concat!("tablesweep/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_markers: strings(&[
                "AFR",
                "ANA",
                "ANT",
                "Fall",
                "Winter",
                "Instructor",
                "Course",
                "Dept",
            ]),
            min_table_rows: 5,
            header_keywords: strings(&[
                "dept",
                "course",
                "instructor",
                "term",
                "year",
                "name",
                "division",
                "ins1",
                "ins2",
                "ins3",
                "ins4",
                "ins5",
                "ins6",
                "artsc1",
                "artsc2",
                "artsc3",
                "artsc4",
                "artsc5",
                "artsc6",
                "number",
                "invited",
                "responses",
                "response",
                "size",
                "first",
                "last",
                "faculty",
                "school",
                "program",
                "evaluation",
                "rating",
                "score",
                "mean",
                "average",
                "section",
                "class",
                "enrollment",
            ]),
            header_indicators: strings(&[
                "dept",
                "department",
                "division",
                "course",
                "subject",
                "code",
                "last name",
                "first name",
                "instructor",
                "term",
                "year",
                "semester",
                "number",
                "invited",
                "responses",
                "evaluation",
                "rating",
                "mean",
            ]),
            department_prefixes: strings(&[
                "AFR", "ANA", "ANT", "AST", "BCH", "BIO", "CHM", "CSC", "ECO", "ENG", "HIS", "MAT",
                "PHY", "PSY", "SOC",
            ]),
            term_names: strings(&["Fall", "Winter", "Summer", "Spring"]),
            fallback_columns: strings(&["Dept", "Course", "Last Name", "First Name", "Term"]),
            accept_threshold: 2,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            stall_threshold: 2,
            navigation_failure_threshold: 1,
            max_pages: 500,
            fetch_retries: 3,
            navigation_retries: 2,
            retry_backoff_ms: 2000,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            poll_interval_ms: 3000,
            min_rows: 5,
        }
    }
}
