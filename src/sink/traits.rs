//! Sink traits and error types
//!
//! This module defines the trait interface for record sinks and associated error types.

use crate::controller::SessionSummary;
use crate::extract::{Fingerprint, Record};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur while committing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Append-only destination for extracted records
///
/// Every page is committed as soon as it is extracted, so whatever was extracted before a
/// crash, a cancellation or a terminal failure stays durable. The persisted layout belongs to
/// the implementation.
pub trait IncrementalSink {
    /// Opens a session for a target
    ///
    /// # Arguments
    ///
    /// * `target` - The report being paginated (a URL or any stable identifier)
    /// * `config_hash` - Hash of the configuration the session runs with
    ///
    /// # Returns
    ///
    /// The ID of the newly created session
    fn begin_session(&mut self, target: &str, config_hash: &str) -> SinkResult<i64>;

    /// Durably commits the records of one page
    ///
    /// Idempotent: committing the same page content for the same target again stores nothing
    /// new. Returns the number of records newly stored.
    fn append(
        &mut self,
        session_id: i64,
        records: &[Record],
        page_number: u32,
        fingerprint: &Fingerprint,
    ) -> SinkResult<usize>;

    /// Fingerprints of every page already committed for a target, by any session
    fn committed_fingerprints(&self, target: &str) -> SinkResult<HashSet<Fingerprint>>;

    /// Records how a session ended
    fn finish_session(&mut self, session_id: i64, summary: &SessionSummary) -> SinkResult<()>;
}
