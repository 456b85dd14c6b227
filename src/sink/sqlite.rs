//! SQLite sink implementation
//!
//! This module provides a SQLite-based implementation of the IncrementalSink trait.

use crate::controller::SessionSummary;
use crate::extract::{Fingerprint, Record};
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{IncrementalSink, SinkError, SinkResult};
use crate::sink::{SessionRecord, StoredRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const SESSION_COLUMNS: &str = "id, target, config_hash, started_at, finished_at, terminal_state, \
     termination_reason, pages_observed, pages_committed, records_committed, error_message";

/// SQLite sink backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Gets a session by ID
    pub fn session(&self, session_id: i64) -> SinkResult<SessionRecord> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
        self.conn
            .query_row(&sql, params![session_id], session_from_row)
            .optional()?
            .ok_or(SinkError::SessionNotFound(session_id))
    }

    /// All sessions, oldest first
    pub fn sessions(&self) -> SinkResult<Vec<SessionRecord>> {
        let sql = format!("SELECT {} FROM sessions ORDER BY id", SESSION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Every record committed for a target, in page and row order
    pub fn records_for_target(&self, target: &str) -> SinkResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, page_number, row_index, record_json FROM records
             WHERE target = ?1 ORDER BY page_number, id",
        )?;

        let rows = stmt
            .query_map(params![target], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(session_id, page_number, row_index, json)| -> SinkResult<StoredRecord> {
                Ok(StoredRecord {
                    session_id,
                    page_number,
                    row_index,
                    record: serde_json::from_str(&json)?,
                })
            })
            .collect()
    }

    /// Number of records committed for a target
    pub fn record_count(&self, target: &str) -> SinkResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE target = ?1",
            params![target],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl IncrementalSink for SqliteSink {
    fn begin_session(&mut self, target: &str, config_hash: &str) -> SinkResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sessions (target, config_hash, started_at) VALUES (?1, ?2, ?3)",
            params![target, config_hash, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn append(
        &mut self,
        session_id: i64,
        records: &[Record],
        page_number: u32,
        fingerprint: &Fingerprint,
    ) -> SinkResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let target: String = tx
            .query_row(
                "SELECT target FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(SinkError::SessionNotFound(session_id))?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO records
                 (session_id, target, page_number, fingerprint, row_index, record_json, committed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for (row_index, record) in records.iter().enumerate() {
                let json = serde_json::to_string(record)?;
                inserted += stmt.execute(params![
                    session_id,
                    target,
                    page_number,
                    fingerprint.as_str(),
                    row_index as i64,
                    json,
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn committed_fingerprints(&self, target: &str) -> SinkResult<HashSet<Fingerprint>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT fingerprint FROM records WHERE target = ?1")?;

        let fingerprints = stmt
            .query_map(params![target], |row| row.get::<_, String>(0))?
            .map(|fp| fp.map(Fingerprint::from_hex))
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(fingerprints)
    }

    fn finish_session(&mut self, session_id: i64, summary: &SessionSummary) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sessions SET finished_at = ?1, terminal_state = ?2, termination_reason = ?3,
                 pages_observed = ?4, pages_committed = ?5, records_committed = ?6,
                 error_message = ?7
             WHERE id = ?8",
            params![
                now,
                summary.terminal_state.to_db_string(),
                summary.termination_reason.to_db_string(),
                summary.total_pages_observed,
                summary.pages_committed,
                summary.total_records as i64,
                summary.error,
                session_id
            ],
        )?;

        if updated == 0 {
            return Err(SinkError::SessionNotFound(session_id));
        }
        Ok(())
    }
}

fn session_from_row(row: &Row) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        target: row.get(1)?,
        config_hash: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        terminal_state: row.get(5)?,
        termination_reason: row.get(6)?,
        pages_observed: row.get(7)?,
        pages_committed: row.get(8)?,
        records_committed: row.get(9)?,
        error_message: row.get(10)?,
    })
}
