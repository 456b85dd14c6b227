use crate::config::{Config, PaginationConfig, ReadinessConfig};
use crate::controller::retry::{RetryDecision, RetryPolicy};
use crate::controller::{SessionSummary, TerminationReason};
use crate::driver::{DriverError, NavigationOutcome, PageDriver, ReadinessProbe};
use crate::extract::{fingerprint, is_repeat, Extractor, Fingerprint, Record};
use crate::sink::IncrementalSink;
use crate::snapshot::PageSnapshot;
use crate::state::{PaginationState, SessionState};
use crate::{Result, SweepError};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// How a session ended, before the summary is assembled
struct Termination {
    reason: TerminationReason,
    error: Option<String>,
}

impl Termination {
    fn new(reason: TerminationReason) -> Self {
        Self {
            reason,
            error: None,
        }
    }

    fn with_error(reason: TerminationReason, error: impl ToString) -> Self {
        Self {
            reason,
            error: Some(error.to_string()),
        }
    }
}

/// Next step after the navigating state
enum Step {
    Fetch,
    Stop(TerminationReason),
}

/// Per-session bookkeeping that is not pagination state
struct SessionTally {
    session_id: i64,
    pages_committed: u32,
    total_records: usize,
    tables_found: u32,
    last_observed_page: Option<u32>,

    /// The current page is fetched again after a navigation that did not move
    refetching: bool,

    /// Fingerprints committed by earlier sessions of the same target
    resumed: HashSet<Fingerprint>,
}

/// Drives one page at a time from the first page to a terminal state
///
/// The controller owns the driver, the sink and the pagination state of the running session.
/// Every page is extracted, fingerprinted and committed before the next navigation starts.
pub struct PaginationController<D: PageDriver, S: IncrementalSink> {
    driver: D,
    sink: S,
    extractor: Extractor,
    probe: ReadinessProbe,
    pagination: PaginationConfig,
    readiness: ReadinessConfig,
    config_hash: String,
    resume: bool,
    cancel: CancellationToken,
    state: SessionState,
}

impl<D: PageDriver, S: IncrementalSink> PaginationController<D, S> {
    /// Creates a controller
    ///
    /// # Arguments
    ///
    /// * `driver` - Source of pages
    /// * `sink` - Destination of committed records
    /// * `config` - Extraction heuristics, pagination limits and readiness polling
    pub fn new(driver: D, sink: S, config: &Config) -> Self {
        Self {
            driver,
            sink,
            extractor: Extractor::new(&config.extraction),
            probe: ReadinessProbe::new(&config.extraction, &config.readiness),
            pagination: config.pagination.clone(),
            readiness: config.readiness.clone(),
            config_hash: String::new(),
            resume: true,
            cancel: CancellationToken::new(),
            state: SessionState::Init,
        }
    }

    /// Hash recorded with every session
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Whether pages committed by earlier sessions of the same target are skipped
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the session at the next fetch or navigation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (D, S) {
        (self.driver, self.sink)
    }

    /// Runs one session against `target`
    ///
    /// # Returns
    ///
    /// * `Ok(SessionSummary)` - The session reached `Done` or `Failed`; failures inside the
    ///   session, including a sink that cannot open it, are reported in the summary
    /// * `Err(SweepError)` - The state machine attempted an illegal transition
    pub async fn run(&mut self, target: &str) -> Result<SessionSummary> {
        let started = Instant::now();
        self.state = SessionState::Init;

        let session_id = match self.sink.begin_session(target, &self.config_hash) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to open a session for {}: {}", target, e);
                self.transition(SessionState::Failed)?;
                return Ok(SessionSummary {
                    session_id: None,
                    target: target.to_string(),
                    total_pages_observed: 0,
                    pages_committed: 0,
                    total_records: 0,
                    stalls_observed: 0,
                    terminal_state: SessionState::Failed,
                    termination_reason: TerminationReason::SinkFailure,
                    elapsed: started.elapsed(),
                    error: Some(e.to_string()),
                });
            }
        };

        let resumed = if self.resume {
            self.sink.committed_fingerprints(target)
        } else {
            Ok(HashSet::new())
        };

        let mut progress = PaginationState::new();
        let (termination, pages_committed, total_records) = match resumed {
            Ok(resumed) => {
                tracing::info!(
                    "Session {} started for {} ({} page(s) already committed)",
                    session_id,
                    target,
                    resumed.len()
                );

                let mut tally = SessionTally {
                    session_id,
                    pages_committed: 0,
                    total_records: 0,
                    tables_found: 0,
                    last_observed_page: None,
                    refetching: false,
                    resumed,
                };
                let termination = self.drive(target, &mut progress, &mut tally).await?;
                (termination, tally.pages_committed, tally.total_records)
            }
            Err(e) => {
                tracing::error!("Failed to read pages committed earlier for {}: {}", target, e);
                (Termination::with_error(TerminationReason::SinkFailure, e), 0, 0)
            }
        };

        let terminal_state = termination.reason.terminal_state();
        self.transition(terminal_state)?;

        let mut summary = SessionSummary {
            session_id: Some(session_id),
            target: target.to_string(),
            total_pages_observed: progress.pages_observed,
            pages_committed,
            total_records,
            stalls_observed: progress.stalls_observed,
            terminal_state,
            termination_reason: termination.reason,
            elapsed: started.elapsed(),
            error: termination.error,
        };

        if let Err(e) = self.sink.finish_session(session_id, &summary) {
            tracing::error!("Failed to record end of session {}: {}", session_id, e);
            if summary.error.is_none() {
                summary.error = Some(e.to_string());
            }
        }

        if summary.is_success() {
            tracing::info!("Session {} finished: {}", session_id, summary);
        } else {
            tracing::error!("Session {} failed: {}", session_id, summary);
        }

        Ok(summary)
    }

    /// Moves through the states until a termination is decided
    ///
    /// Leaves the controller in the state the terminal transition starts from.
    async fn drive(
        &mut self,
        target: &str,
        progress: &mut PaginationState,
        tally: &mut SessionTally,
    ) -> Result<Termination> {
        if self.cancel.is_cancelled() {
            return Ok(Termination::new(TerminationReason::Cancelled));
        }

        if let Err(termination) = self.load(target).await {
            return Ok(termination);
        }
        self.transition(SessionState::FetchingPage)?;

        loop {
            // ===== FetchingPage =====
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled before fetching page {}", progress.current_page);
                return Ok(Termination::new(TerminationReason::Cancelled));
            }

            let snapshot = match self.fetch_page(progress.current_page).await {
                Ok(snapshot) => snapshot,
                Err(termination) => return Ok(termination),
            };

            if tally.last_observed_page != Some(progress.current_page) {
                tally.last_observed_page = Some(progress.current_page);
                progress.pages_observed += 1;
            }
            if let Some(hint) = self.driver.total_pages_hint() {
                progress.revise_total_pages(hint);
            }

            // ===== Extracting =====
            self.transition(SessionState::Extracting)?;
            let extraction = self.extractor.extract(&snapshot);

            if extraction.table_found() {
                tally.tables_found += 1;
                if let (Some(schema), Some(profile)) = (&extraction.schema, &extraction.profile) {
                    tracing::debug!(
                        "Page {}: {} columns via {}, profile {:?}",
                        progress.current_page,
                        schema.schema.len(),
                        schema.source,
                        profile
                    );
                }
                if extraction.records.is_empty() {
                    tracing::warn!(
                        "Low-confidence extraction on page {}: no row accepted ({} rejected)",
                        progress.current_page,
                        extraction.rejected
                    );
                }
            } else if progress.current_page == 1 && tally.tables_found == 0 {
                tracing::error!("No data table located on the first page");
                return Ok(Termination::new(TerminationReason::NoDataTable));
            } else {
                tracing::warn!("No data table located on page {}", progress.current_page);
            }

            // ===== Committing =====
            self.transition(SessionState::Committing)?;
            let committed = self.commit(&extraction.records, progress, tally);
            tally.refetching = false;
            if let Err(termination) = committed {
                return Ok(termination);
            }

            // ===== Navigating =====
            self.transition(SessionState::Navigating)?;
            match self.navigate(progress, tally).await {
                Step::Fetch => self.transition(SessionState::FetchingPage)?,
                Step::Stop(reason) => return Ok(Termination::new(reason)),
            }
        }
    }

    /// Opens the target, retrying transient failures
    async fn load(&mut self, target: &str) -> std::result::Result<(), Termination> {
        let policy = self.fetch_policy();
        let mut attempt = 1;

        loop {
            match self.driver.load(target).await {
                Ok(()) => return Ok(()),
                Err(e) => self.backoff_or_fail(&policy, &e, &mut attempt).await?,
            }
        }
    }

    /// Waits for the page to render and captures it, retrying transient failures
    async fn fetch_page(&mut self, page: u32) -> std::result::Result<PageSnapshot, Termination> {
        let policy = self.fetch_policy();
        let mut attempt = 1;

        loop {
            match self.capture(page).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => self.backoff_or_fail(&policy, &e, &mut attempt).await?,
            }
        }
    }

    async fn capture(&mut self, page: u32) -> std::result::Result<PageSnapshot, DriverError> {
        let probe = &self.probe;
        let predicate = move |snapshot: &PageSnapshot| probe.is_ready(snapshot);

        let ready = self
            .driver
            .wait_until_ready(
                &predicate,
                self.readiness.max_attempts,
                Duration::from_millis(self.readiness.poll_interval_ms),
            )
            .await?;

        if !ready {
            tracing::warn!(
                "Page {} not ready after {} poll(s), extracting what it shows",
                page,
                self.readiness.max_attempts
            );
        }

        self.driver.snapshot().await
    }

    /// Sleeps before the next attempt, or ends the session when the budget is spent
    async fn backoff_or_fail(
        &self,
        policy: &RetryPolicy,
        error: &DriverError,
        attempt: &mut u32,
    ) -> std::result::Result<(), Termination> {
        match policy.should_retry(error, *attempt) {
            RetryDecision::Retry { delay, attempt: next } => {
                tracing::warn!("Driver error ({}), retrying in {:?}", error, delay);
                tokio::time::sleep(delay).await;
                *attempt = next;
                Ok(())
            }
            RetryDecision::DoNotRetry { reason } => {
                tracing::error!("Giving up on page: {}", reason);
                let termination = if error.is_transient() {
                    TerminationReason::FetchRetriesExhausted
                } else {
                    TerminationReason::PageUnavailable
                };
                Err(Termination::with_error(termination, error))
            }
        }
    }

    /// Fingerprints the page and hands new content to the sink
    ///
    /// Pages without records are neither committed nor counted as stalls. A repeat seen while
    /// refetching after a navigation that did not move was already counted by `navigate`.
    fn commit(
        &mut self,
        records: &[Record],
        progress: &mut PaginationState,
        tally: &mut SessionTally,
    ) -> std::result::Result<(), Termination> {
        if records.is_empty() {
            return Ok(());
        }

        let page = progress.current_page;
        let fp = fingerprint(records);

        if is_repeat(&fp, progress) {
            if tally.refetching {
                tracing::debug!("Page {} unchanged after navigation", page);
                return Ok(());
            }
            progress.record_stall();
            tracing::info!(
                "Page {} repeats earlier content (stall {}/{})",
                page,
                progress.consecutive_stall_count,
                self.pagination.stall_threshold
            );
            return Ok(());
        }

        if tally.resumed.contains(&fp) {
            tracing::info!("Page {} was committed by an earlier session, skipping", page);
            progress.record_fingerprint(fp);
            progress.record_progress();
            return Ok(());
        }

        match self.sink.append(tally.session_id, records, page, &fp) {
            Ok(stored) => {
                tracing::info!(
                    "Committed page {}: {} record(s), {} new",
                    page,
                    records.len(),
                    stored
                );
                tally.pages_committed += 1;
                tally.total_records += records.len();
                progress.record_fingerprint(fp);
                progress.record_progress();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to commit page {}: {}", page, e);
                Err(Termination::with_error(TerminationReason::SinkFailure, e))
            }
        }
    }

    /// Decides whether to stop, and moves to the next page if not
    ///
    /// A failed navigation counts only against the navigation-failure threshold. A navigation
    /// that reports success without moving counts as one stall.
    async fn navigate(&mut self, progress: &mut PaginationState, tally: &mut SessionTally) -> Step {
        let stall_threshold = self.pagination.stall_threshold;

        if progress.consecutive_stall_count >= stall_threshold {
            return Step::Stop(TerminationReason::StallLimit);
        }
        if progress.on_last_page() {
            return Step::Stop(TerminationReason::LastPageReached);
        }
        if self.driver.has_next_page() == Some(false) {
            return Step::Stop(TerminationReason::NoFurtherPage);
        }
        if progress.current_page >= self.pagination.max_pages {
            return Step::Stop(TerminationReason::MaxPagesReached);
        }
        if self.cancel.is_cancelled() {
            return Step::Stop(TerminationReason::Cancelled);
        }

        let outcome = self.advance_with_retries().await;
        match outcome {
            NavigationOutcome::NoFurtherPage => Step::Stop(TerminationReason::NoFurtherPage),
            NavigationOutcome::Failed => {
                progress.record_navigation_failure();
                tracing::warn!(
                    "Navigation from page {} failed ({}/{})",
                    progress.current_page,
                    progress.consecutive_navigation_failures,
                    self.pagination.navigation_failure_threshold
                );

                if progress.consecutive_navigation_failures
                    >= self.pagination.navigation_failure_threshold
                {
                    Step::Stop(TerminationReason::NavigationFailed)
                } else {
                    tally.refetching = true;
                    Step::Fetch
                }
            }
            NavigationOutcome::Succeeded => {
                let expected = progress.current_page + 1;
                let observed = self.driver.current_page_number().unwrap_or(expected);

                if progress.advance_to(observed) {
                    tracing::debug!("Moved to page {}", observed);
                    Step::Fetch
                } else {
                    progress.record_stall();
                    tracing::warn!(
                        "Navigation reported success but the page number stayed at {} (stall {}/{})",
                        observed,
                        progress.consecutive_stall_count,
                        stall_threshold
                    );
                    if progress.consecutive_stall_count >= stall_threshold {
                        Step::Stop(TerminationReason::StallLimit)
                    } else {
                        tally.refetching = true;
                        Step::Fetch
                    }
                }
            }
        }
    }

    async fn advance_with_retries(&mut self) -> NavigationOutcome {
        let attempts = self.pagination.navigation_retries + 1;
        let backoff = Duration::from_millis(self.pagination.retry_backoff_ms);

        for attempt in 1..=attempts {
            let outcome = self.driver.advance_page().await;
            if outcome != NavigationOutcome::Failed {
                return outcome;
            }
            if attempt < attempts {
                tracing::debug!("Navigation attempt {}/{} failed", attempt, attempts);
                tokio::time::sleep(backoff).await;
            }
        }
        NavigationOutcome::Failed
    }

    fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.pagination.fetch_retries,
            Duration::from_millis(self.pagination.retry_backoff_ms),
        )
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
