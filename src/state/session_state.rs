/// Session state definitions for the pagination state machine
///
/// A session moves through these states one page at a time until it reaches `Done` or
/// `Failed`.
use std::fmt;

/// Represents the current state of a pagination session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    // ===== Active States =====
    /// Session opened, target not loaded yet
    Init,

    /// Waiting for the current page and capturing its snapshot
    FetchingPage,

    /// Locating the table, inferring the schema and validating rows
    Extracting,

    /// Fingerprinting the page and handing its records to the sink
    Committing,

    /// Deciding whether to stop or move to the next page
    Navigating,

    // ===== Terminal States =====
    /// Session ended normally
    Done,

    /// Session ended on an unrecoverable condition
    Failed,
}

impl SessionState {
    /// Returns true if this is a terminal state (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the state machine may move from `self` to `next`
    ///
    /// Any active state may fail. `Done` is reachable from `Init` (cancelled before the first
    /// fetch), from `FetchingPage` (cancelled mid-session) and from `Navigating`.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Init, FetchingPage) | (Init, Done) => true,
            (FetchingPage, Extracting) | (FetchingPage, Done) => true,
            (Extracting, Committing) => true,
            (Committing, Navigating) => true,
            (Navigating, FetchingPage) | (Navigating, Done) => true,
            _ => false,
        }
    }

    /// Converts the session state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FetchingPage => "fetching_page",
            Self::Extracting => "extracting",
            Self::Committing => "committing",
            Self::Navigating => "navigating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Parses a session state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Self::Init),
            "fetching_page" => Some(Self::FetchingPage),
            "extracting" => Some(Self::Extracting),
            "committing" => Some(Self::Committing),
            "navigating" => Some(Self::Navigating),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible session states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Init,
            Self::FetchingPage,
            Self::Extracting,
            Self::Committing,
            Self::Navigating,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
