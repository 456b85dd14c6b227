//! In-memory page driver
//!
//! Serves a fixed list of snapshots, one per page. Used to replay captured pages and to
//! exercise the pagination controller against hosts that misbehave in known ways.

use crate::driver::{DriverError, DriverResult, NavigationOutcome, PageDriver};
use crate::snapshot::PageSnapshot;
use async_trait::async_trait;

/// What happens when the driver is asked to move past its last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBehavior {
    /// Report that there is no next page
    NoFurtherPage,

    /// Keep advancing the page number while showing the last page again
    RepeatLast,

    /// Report a failed navigation
    Fail,
}

/// Page driver over a list of canned snapshots
#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    pages: Vec<PageSnapshot>,
    end: EndBehavior,
    page_number: u32,
    loaded: bool,
    frozen: bool,
    reports_page_numbers: bool,
    total_pages: Option<u32>,
    failing_navigations: u32,
    failing_snapshots: u32,
    navigations: u32,
    snapshots: u32,
}

impl ScriptedDriver {
    pub fn new(pages: Vec<PageSnapshot>) -> Self {
        Self {
            pages,
            end: EndBehavior::NoFurtherPage,
            page_number: 1,
            loaded: false,
            frozen: false,
            reports_page_numbers: true,
            total_pages: None,
            failing_navigations: 0,
            failing_snapshots: 0,
            navigations: 0,
            snapshots: 0,
        }
    }

    pub fn with_end(mut self, end: EndBehavior) -> Self {
        self.end = end;
        self
    }

    /// Navigations report success but the page never changes
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// The host does not expose page numbers
    pub fn without_page_numbers(mut self) -> Self {
        self.reports_page_numbers = false;
        self
    }

    pub fn with_total_pages(mut self, total: u32) -> Self {
        self.total_pages = Some(total);
        self
    }

    /// The next `count` navigations fail
    pub fn failing_navigations(mut self, count: u32) -> Self {
        self.failing_navigations = count;
        self
    }

    /// The next `count` snapshots fail with a transient error
    pub fn failing_snapshots(mut self, count: u32) -> Self {
        self.failing_snapshots = count;
        self
    }

    /// Number of `advance_page` calls so far
    pub fn navigations(&self) -> u32 {
        self.navigations
    }

    /// Number of `snapshot` calls so far
    pub fn snapshots(&self) -> u32 {
        self.snapshots
    }

    fn current(&self) -> PageSnapshot {
        let index = (self.page_number as usize).saturating_sub(1);
        self.pages
            .get(index)
            .or_else(|| self.pages.last())
            .cloned()
            .unwrap_or_else(PageSnapshot::empty)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn load(&mut self, target: &str) -> DriverResult<()> {
        if target.is_empty() {
            return Err(DriverError::InvalidTarget("empty target".to_string()));
        }
        self.loaded = true;
        self.page_number = 1;
        Ok(())
    }

    async fn snapshot(&mut self) -> DriverResult<PageSnapshot> {
        if !self.loaded {
            return Err(DriverError::NotLoaded);
        }
        self.snapshots += 1;
        if self.failing_snapshots > 0 {
            self.failing_snapshots -= 1;
            return Err(DriverError::Transient("scripted snapshot failure".to_string()));
        }
        Ok(self.current())
    }

    async fn advance_page(&mut self) -> NavigationOutcome {
        self.navigations += 1;

        if !self.loaded {
            return NavigationOutcome::Failed;
        }
        if self.failing_navigations > 0 {
            self.failing_navigations -= 1;
            return NavigationOutcome::Failed;
        }
        if self.frozen {
            return NavigationOutcome::Succeeded;
        }

        if self.page_number as usize >= self.pages.len() {
            match self.end {
                EndBehavior::NoFurtherPage => return NavigationOutcome::NoFurtherPage,
                EndBehavior::Fail => return NavigationOutcome::Failed,
                EndBehavior::RepeatLast => {}
            }
        }

        self.page_number += 1;
        NavigationOutcome::Succeeded
    }

    fn current_page_number(&self) -> Option<u32> {
        self.reports_page_numbers.then_some(self.page_number)
    }

    fn total_pages_hint(&self) -> Option<u32> {
        self.total_pages
    }
}
