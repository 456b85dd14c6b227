use crate::state::SessionState;
use std::fmt;
use std::time::Duration;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    // ===== Normal completion =====
    /// Pages stopped producing new content
    StallLimit,

    /// The host's page count was reached
    LastPageReached,

    /// The host offers no way forward
    NoFurtherPage,

    /// The configured page ceiling was reached
    MaxPagesReached,

    /// Navigation kept failing; what was extracted is kept
    NavigationFailed,

    /// The caller cancelled the session
    Cancelled,

    // ===== Failures =====
    /// The first page carries no recognizable data table
    NoDataTable,

    /// A page could not be captured within the retry budget
    FetchRetriesExhausted,

    /// A page could not be captured and retrying would not help
    PageUnavailable,

    /// The sink refused a commit
    SinkFailure,
}

impl TerminationReason {
    /// Returns true if the session ends in `Failed` for this reason
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::NoDataTable | Self::FetchRetriesExhausted | Self::PageUnavailable | Self::SinkFailure
        )
    }

    /// Terminal state a session ending for this reason lands in
    pub fn terminal_state(&self) -> SessionState {
        if self.is_failure() {
            SessionState::Failed
        } else {
            SessionState::Done
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::StallLimit => "no new content on consecutive pages",
            Self::LastPageReached => "last page reached",
            Self::NoFurtherPage => "no further page",
            Self::MaxPagesReached => "page limit reached",
            Self::NavigationFailed => "navigation failed",
            Self::Cancelled => "cancelled",
            Self::NoDataTable => "no data table located",
            Self::FetchRetriesExhausted => "page fetch retries exhausted",
            Self::PageUnavailable => "page unavailable",
            Self::SinkFailure => "sink failure",
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::StallLimit => "stall_limit",
            Self::LastPageReached => "last_page_reached",
            Self::NoFurtherPage => "no_further_page",
            Self::MaxPagesReached => "max_pages_reached",
            Self::NavigationFailed => "navigation_failed",
            Self::Cancelled => "cancelled",
            Self::NoDataTable => "no_data_table",
            Self::FetchRetriesExhausted => "fetch_retries_exhausted",
            Self::PageUnavailable => "page_unavailable",
            Self::SinkFailure => "sink_failure",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "stall_limit" => Some(Self::StallLimit),
            "last_page_reached" => Some(Self::LastPageReached),
            "no_further_page" => Some(Self::NoFurtherPage),
            "max_pages_reached" => Some(Self::MaxPagesReached),
            "navigation_failed" => Some(Self::NavigationFailed),
            "cancelled" => Some(Self::Cancelled),
            "no_data_table" => Some(Self::NoDataTable),
            "fetch_retries_exhausted" => Some(Self::FetchRetriesExhausted),
            "page_unavailable" => Some(Self::PageUnavailable),
            "sink_failure" => Some(Self::SinkFailure),
            _ => None,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of one pagination session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Sink session ID
    pub session_id: Option<i64>,

    pub target: String,

    /// Distinct page numbers captured
    pub total_pages_observed: u32,

    /// Pages handed to the sink
    pub pages_committed: u32,

    /// Records handed to the sink
    pub total_records: usize,

    pub stalls_observed: u32,

    /// `Done` or `Failed`
    pub terminal_state: SessionState,

    pub termination_reason: TerminationReason,

    pub elapsed: Duration,

    /// Error behind a failure, if one was raised
    pub error: Option<String>,
}

impl SessionSummary {
    /// Returns true if the session ended in `Done`
    pub fn is_success(&self) -> bool {
        self.terminal_state == SessionState::Done
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} page(s) observed, {} committed, {} record(s), {} stall(s) in {:.1}s",
            self.terminal_state,
            self.termination_reason,
            self.total_pages_observed,
            self.pages_committed,
            self.total_records,
            self.stalls_observed,
            self.elapsed.as_secs_f64()
        )
    }
}
