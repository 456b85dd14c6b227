//! Sink module for persisting extracted records
//!
//! This module handles the durable side of a session:
//! - SQLite database initialization and schema management
//! - Page-at-a-time commits of validated records
//! - Session bookkeeping and resumption support
//! - An in-memory sink for embedding and tests

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{CommittedPage, MemorySink};
pub use sqlite::SqliteSink;
pub use traits::{IncrementalSink, SinkError, SinkResult};

use crate::extract::Record;
use std::path::Path;

/// Opens or creates the sink database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteSink)` - Successfully initialized sink
/// * `Err(SinkError)` - Failed to initialize the database
pub fn open_sink(path: &Path) -> SinkResult<SqliteSink> {
    SqliteSink::new(path)
}

/// Represents a session in the database
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub target: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub terminal_state: Option<String>,
    pub termination_reason: Option<String>,
    pub pages_observed: u32,
    pub pages_committed: u32,
    pub records_committed: u32,
    pub error_message: Option<String>,
}

/// A committed record read back from the database
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub session_id: i64,
    pub page_number: u32,
    pub row_index: u32,
    pub record: Record,
}
