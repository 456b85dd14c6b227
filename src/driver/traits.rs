use crate::config::{ExtractionConfig, ReadinessConfig};
use crate::extract::TableLocator;
use crate::snapshot::PageSnapshot;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    /// Worth retrying: timeouts, dropped connections, server errors
    #[error("Transient driver failure: {0}")]
    Transient(String),

    /// Will fail again on retry
    #[error("Permanent driver failure: {0}")]
    Permanent(String),

    /// The host has no page at the requested location
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("No page loaded")]
    NotLoaded,
}

impl DriverError {
    /// Returns true if the operation may succeed when repeated
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Result of asking the driver to move to the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The navigation completed; the page number must still be checked
    Succeeded,

    /// There is no next page
    NoFurtherPage,

    /// The navigation did not complete
    Failed,
}

/// Predicate deciding whether a page has finished rendering its data
pub type ReadinessPredicate<'a> = &'a (dyn Fn(&PageSnapshot) -> bool + Send + Sync);

/// Controls the source of pages
///
/// Implementations own whatever session they need (an HTTP client, a browser tab, a list of
/// canned pages). The controller calls them strictly sequentially.
#[async_trait]
pub trait PageDriver: Send {
    /// Opens the target and positions the driver on its first page
    async fn load(&mut self, target: &str) -> DriverResult<()>;

    /// Captures the current page
    async fn snapshot(&mut self) -> DriverResult<PageSnapshot>;

    /// Moves to the next page
    async fn advance_page(&mut self) -> NavigationOutcome;

    /// Page number the host reports for the current page, if it reports one
    fn current_page_number(&self) -> Option<u32>;

    /// Page count the host reports, if it reports one
    fn total_pages_hint(&self) -> Option<u32> {
        None
    }

    /// Whether the current page offers a way forward, when observable without navigating
    fn has_next_page(&self) -> Option<bool> {
        None
    }

    /// Polls the page until `predicate` holds or the attempts run out
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The page became ready
    /// * `Ok(false)` - It never did; the caller proceeds with what the page shows
    /// * `Err(DriverError)` - Capturing the page failed
    async fn wait_until_ready(
        &mut self,
        predicate: ReadinessPredicate<'_>,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> DriverResult<bool> {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let snapshot = self.snapshot().await?;
            if predicate(&snapshot) {
                debug!("Page ready after {} attempt(s)", attempt);
                return Ok(true);
            }
            if attempt < max_attempts {
                tokio::time::sleep(poll_interval).await;
            }
        }
        Ok(false)
    }
}

/// Standard readiness check: a table with enough rows that holds a content marker
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    locator: TableLocator,
}

impl ReadinessProbe {
    pub fn new(extraction: &ExtractionConfig, readiness: &ReadinessConfig) -> Self {
        Self {
            locator: TableLocator::new(extraction).with_min_rows(readiness.min_rows),
        }
    }

    pub fn is_ready(&self, snapshot: &PageSnapshot) -> bool {
        self.locator.locate(snapshot).is_some()
    }
}
