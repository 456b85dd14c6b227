//! Statistics generation from the sink database
//!
//! This module provides functionality for summarizing past sessions
//! recorded by the SQLite sink.

use crate::sink::{SessionRecord, SinkResult, SqliteSink};
use std::collections::BTreeMap;

/// Session statistics summary
#[derive(Debug, Clone)]
pub struct SessionStatistics {
    /// Every recorded session, oldest first
    pub sessions: Vec<SessionRecord>,

    /// Records stored across all sessions
    pub total_records: u64,

    /// Count of finished sessions by terminal state
    pub sessions_by_state: BTreeMap<String, u64>,

    /// Count of finished sessions by termination reason
    pub sessions_by_reason: BTreeMap<String, u64>,
}

impl SessionStatistics {
    /// Builds statistics from session rows
    pub fn from_sessions(sessions: Vec<SessionRecord>) -> Self {
        let mut sessions_by_state = BTreeMap::new();
        let mut sessions_by_reason = BTreeMap::new();

        for session in &sessions {
            let state = session
                .terminal_state
                .clone()
                .unwrap_or_else(|| "unfinished".to_string());
            *sessions_by_state.entry(state).or_insert(0) += 1;

            if let Some(reason) = &session.termination_reason {
                *sessions_by_reason.entry(reason.clone()).or_insert(0) += 1;
            }
        }

        let total_records = sessions
            .iter()
            .map(|s| u64::from(s.records_committed))
            .sum();

        Self {
            sessions,
            total_records,
            sessions_by_state,
            sessions_by_reason,
        }
    }

    /// Sessions that ended in `done`, as a percentage of all sessions
    pub fn success_rate(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        let done = self.sessions_by_state.get("done").copied().unwrap_or(0);
        (done as f64 / self.sessions.len() as f64) * 100.0
    }
}

/// Loads statistics from the sink database
///
/// # Arguments
///
/// * `sink` - The sink to query
///
/// # Returns
///
/// * `Ok(SessionStatistics)` - Successfully loaded statistics
/// * `Err(SinkError)` - Failed to query sessions
pub fn load_statistics(sink: &SqliteSink) -> SinkResult<SessionStatistics> {
    Ok(SessionStatistics::from_sessions(sink.sessions()?))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SessionStatistics) {
    println!("=== Session Statistics ===\n");

    println!("Overview:");
    println!("  Sessions: {}", stats.sessions.len());
    println!("  Records committed: {}", stats.total_records);
    println!();

    println!("Sessions by State:");
    for (state, count) in &stats.sessions_by_state {
        println!("  {}: {}", state, count);
    }
    println!();

    if !stats.sessions_by_reason.is_empty() {
        println!("Termination Reasons:");
        let mut reasons: Vec<_> = stats.sessions_by_reason.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in reasons {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    println!("Sessions:");
    for session in &stats.sessions {
        println!(
            "  #{} {} [{}] pages {}/{} records {}{}",
            session.id,
            session.target,
            session.terminal_state.as_deref().unwrap_or("unfinished"),
            session.pages_committed,
            session.pages_observed,
            session.records_committed,
            session
                .error_message
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
    }
    println!();

    println!("Success Rate: {:.1}%", stats.success_rate());
}
