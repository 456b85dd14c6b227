use crate::controller::SessionSummary;
use crate::extract::{Fingerprint, Record};
use crate::sink::traits::{IncrementalSink, SinkError, SinkResult};
use std::collections::HashSet;

/// One page as committed to a [`MemorySink`]
#[derive(Debug, Clone)]
pub struct CommittedPage {
    pub session_id: i64,
    pub target: String,
    pub page_number: u32,
    pub fingerprint: Fingerprint,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone)]
struct MemorySession {
    target: String,
    summary: Option<SessionSummary>,
}

/// Sink keeping everything in memory
///
/// Has the same idempotence as the SQLite sink: a page whose fingerprint was already
/// committed for the same target is not stored again.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sessions: Vec<MemorySession>,
    pages: Vec<CommittedPage>,
    remaining_appends: Option<usize>,
    refuse_sessions: bool,
    refuse_reads: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every append after the first `count` fail
    pub fn failing_after(mut self, count: usize) -> Self {
        self.remaining_appends = Some(count);
        self
    }

    /// Makes `begin_session` fail
    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }

    /// Makes `committed_fingerprints` fail
    pub fn refusing_reads(mut self) -> Self {
        self.refuse_reads = true;
        self
    }

    pub fn pages(&self) -> &[CommittedPage] {
        &self.pages
    }

    /// All committed records in commit order
    pub fn records(&self) -> Vec<&Record> {
        self.pages.iter().flat_map(|p| p.records.iter()).collect()
    }

    /// Summary recorded by `finish_session`, if the session was finished
    pub fn summary(&self, session_id: i64) -> Option<&SessionSummary> {
        self.session(session_id)
            .ok()
            .and_then(|s| s.summary.as_ref())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, session_id: i64) -> SinkResult<&MemorySession> {
        usize::try_from(session_id - 1)
            .ok()
            .and_then(|index| self.sessions.get(index))
            .ok_or(SinkError::SessionNotFound(session_id))
    }
}

impl IncrementalSink for MemorySink {
    fn begin_session(&mut self, target: &str, _config_hash: &str) -> SinkResult<i64> {
        if self.refuse_sessions {
            return Err(SinkError::Unavailable("memory sink refuses sessions".to_string()));
        }
        self.sessions.push(MemorySession {
            target: target.to_string(),
            summary: None,
        });
        Ok(self.sessions.len() as i64)
    }

    fn append(
        &mut self,
        session_id: i64,
        records: &[Record],
        page_number: u32,
        fingerprint: &Fingerprint,
    ) -> SinkResult<usize> {
        if let Some(remaining) = self.remaining_appends.as_mut() {
            if *remaining == 0 {
                return Err(SinkError::Unavailable("memory sink closed".to_string()));
            }
            *remaining -= 1;
        }

        let target = self.session(session_id)?.target.clone();
        let duplicate = self
            .pages
            .iter()
            .any(|p| p.target == target && p.fingerprint == *fingerprint);
        if duplicate {
            return Ok(0);
        }

        self.pages.push(CommittedPage {
            session_id,
            target,
            page_number,
            fingerprint: fingerprint.clone(),
            records: records.to_vec(),
        });
        Ok(records.len())
    }

    fn committed_fingerprints(&self, target: &str) -> SinkResult<HashSet<Fingerprint>> {
        if self.refuse_reads {
            return Err(SinkError::Unavailable("memory sink refuses reads".to_string()));
        }
        Ok(self
            .pages
            .iter()
            .filter(|p| p.target == target)
            .map(|p| p.fingerprint.clone())
            .collect())
    }

    fn finish_session(&mut self, session_id: i64, summary: &SessionSummary) -> SinkResult<()> {
        self.session(session_id)?;
        if let Some(session) = usize::try_from(session_id - 1)
            .ok()
            .and_then(|index| self.sessions.get_mut(index))
        {
            session.summary = Some(summary.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fingerprint;

    #[test]
    fn test_append_is_idempotent_per_target() {
        let mut sink = MemorySink::new();
        let a = sink.begin_session("report-a", "h").unwrap();
        let b = sink.begin_session("report-b", "h").unwrap();
        let records = vec![Record::from_columns(&["Dept"], &["CSC"])];
        let fp = fingerprint(&records);

        assert_eq!(sink.append(a, &records, 1, &fp).unwrap(), 1);
        assert_eq!(sink.append(a, &records, 1, &fp).unwrap(), 0);
        assert_eq!(sink.append(b, &records, 1, &fp).unwrap(), 1);
        assert_eq!(sink.pages().len(), 2);
        assert_eq!(sink.committed_fingerprints("report-a").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_session() {
        let mut sink = MemorySink::new();
        let fp = Fingerprint::from_hex("00");
        assert!(matches!(
            sink.append(1, &[], 1, &fp),
            Err(SinkError::SessionNotFound(1))
        ));
        assert!(sink.summary(0).is_none());
    }

    #[test]
    fn test_failing_after() {
        let mut sink = MemorySink::new().failing_after(1);
        let id = sink.begin_session("report", "h").unwrap();
        let records = vec![Record::from_columns(&["Dept"], &["CSC"])];

        assert!(sink.append(id, &records, 1, &fingerprint(&records)).is_ok());
        assert!(matches!(
            sink.append(id, &records, 2, &Fingerprint::from_hex("01")),
            Err(SinkError::Unavailable(_))
        ));
    }

    #[test]
    fn test_refusing_sessions_and_reads() {
        let mut sink = MemorySink::new().refusing_sessions();
        assert!(matches!(
            sink.begin_session("report", "h"),
            Err(SinkError::Unavailable(_))
        ));
        assert_eq!(sink.session_count(), 0);

        let sink = MemorySink::new().refusing_reads();
        assert!(sink.committed_fingerprints("report").is_err());
    }
}
