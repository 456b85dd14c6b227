use crate::extract::{Record, RECORD_SEPARATOR};
use crate::state::PaginationState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content hash of the records extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a previously computed hex digest
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of a page's records
///
/// SHA-256 over the sorted, deduplicated canonical forms of the records, each followed by the
/// record separator. The result depends only on the set of distinct rows.
pub fn fingerprint(records: &[Record]) -> Fingerprint {
    let mut canonical: Vec<String> = records.iter().map(Record::canonical_form).collect();
    canonical.sort_unstable();
    canonical.dedup();

    let mut hasher = Sha256::new();
    for form in &canonical {
        hasher.update(form.as_bytes());
        hasher.update([RECORD_SEPARATOR as u8]);
    }
    Fingerprint(hex::encode(hasher.finalize()))
}

/// True if a page with this fingerprint was already seen in the session
pub fn is_repeat(fingerprint: &Fingerprint, state: &PaginationState) -> bool {
    state.has_seen(fingerprint)
}
