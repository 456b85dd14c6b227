//! Output module for reporting session results
//!
//! This module handles:
//! - Printing the summary of a finished session
//! - Recording and displaying statistics over past sessions

pub mod stats;

pub use stats::{load_statistics, print_statistics, SessionStatistics};

use crate::controller::SessionSummary;

/// Renders a session summary as the lines printed after a run
pub fn render_summary(summary: &SessionSummary) -> Vec<String> {
    let mut lines = vec![
        "=== Session Summary ===".to_string(),
        format!("Target: {}", summary.target),
    ];

    if let Some(id) = summary.session_id {
        lines.push(format!("Session: #{}", id));
    }

    lines.push(format!(
        "Result: {} ({})",
        summary.terminal_state, summary.termination_reason
    ));
    lines.push(format!("Pages observed: {}", summary.total_pages_observed));
    lines.push(format!("Pages committed: {}", summary.pages_committed));
    lines.push(format!("Records committed: {}", summary.total_records));
    lines.push(format!("Stalls: {}", summary.stalls_observed));
    lines.push(format!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64()));

    if let Some(error) = &summary.error {
        lines.push(format!("Error: {}", error));
    }

    lines
}

/// Prints a session summary to stdout
pub fn print_summary(summary: &SessionSummary) {
    for line in render_summary(summary) {
        println!("{}", line);
    }
}
