use crate::extract::Fingerprint;
use std::collections::HashSet;

/// Progress of one pagination session
///
/// Owned by the controller and changed only at state transitions. `current_page` never
/// decreases and `seen_page_fingerprints` never shrinks.
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// 1-based number of the page being processed
    pub current_page: u32,

    /// Best known page count; revised as the host reports it, never below `current_page`
    pub total_pages: Option<u32>,

    /// Stalls since the last page that produced new content
    pub consecutive_stall_count: u32,

    /// Failed navigations since the last successful one
    pub consecutive_navigation_failures: u32,

    /// Total stalls over the whole session
    pub stalls_observed: u32,

    /// Distinct page numbers processed so far
    pub pages_observed: u32,

    seen_page_fingerprints: HashSet<Fingerprint>,
}

impl PaginationState {
    /// Creates the state for a fresh session positioned on page 1
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: None,
            consecutive_stall_count: 0,
            consecutive_navigation_failures: 0,
            stalls_observed: 0,
            pages_observed: 0,
            seen_page_fingerprints: HashSet::new(),
        }
    }

    pub fn has_seen(&self, fingerprint: &Fingerprint) -> bool {
        self.seen_page_fingerprints.contains(fingerprint)
    }

    /// Remembers a page fingerprint
    ///
    /// # Returns
    ///
    /// * `true` - The fingerprint was new
    /// * `false` - It had been seen before
    pub fn record_fingerprint(&mut self, fingerprint: Fingerprint) -> bool {
        self.seen_page_fingerprints.insert(fingerprint)
    }

    pub fn seen_count(&self) -> usize {
        self.seen_page_fingerprints.len()
    }

    /// Counts a page that produced nothing new
    pub fn record_stall(&mut self) {
        self.consecutive_stall_count += 1;
        self.stalls_observed += 1;
    }

    /// Counts a page that produced new content
    pub fn record_progress(&mut self) {
        self.consecutive_stall_count = 0;
    }

    pub fn record_navigation_failure(&mut self) {
        self.consecutive_navigation_failures += 1;
    }

    /// Moves to a later page
    ///
    /// Returns false and leaves the state untouched if `page` is not strictly greater than
    /// the current page.
    pub fn advance_to(&mut self, page: u32) -> bool {
        if page <= self.current_page {
            return false;
        }
        self.current_page = page;
        self.consecutive_navigation_failures = 0;
        if let Some(total) = self.total_pages {
            self.total_pages = Some(total.max(page));
        }
        true
    }

    /// Revises the page count estimate; it never drops below the current page
    pub fn revise_total_pages(&mut self, hint: u32) {
        self.total_pages = Some(hint.max(self.current_page));
    }

    /// True if the page count is known and the current page is the last one
    pub fn on_last_page(&self) -> bool {
        self.total_pages
            .map(|total| self.current_page >= total)
            .unwrap_or(false)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}
