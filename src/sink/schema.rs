//! Database schema definitions
//!
//! This module contains the SQL schema of the Tablesweep database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per pagination session
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    terminal_state TEXT,
    termination_reason TEXT,
    pages_observed INTEGER NOT NULL DEFAULT 0,
    pages_committed INTEGER NOT NULL DEFAULT 0,
    records_committed INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_target ON sessions(target);

-- Validated rows, one per table row; a page is identified by its fingerprint
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    target TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    fingerprint TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    record_json TEXT NOT NULL,
    committed_at TEXT NOT NULL,
    UNIQUE(target, fingerprint, row_index)
);

CREATE INDEX IF NOT EXISTS idx_records_target ON records(target, fingerprint);
CREATE INDEX IF NOT EXISTS idx_records_session ON records(session_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
