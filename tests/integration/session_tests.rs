//! Integration tests for whole pagination sessions
//!
//! These tests drive the controller with scripted page drivers and check what ends up
//! in the sink once the session reaches a terminal state.

use async_trait::async_trait;
use tablesweep::config::{parse_config, Config};
use tablesweep::driver::{DriverResult, EndBehavior, ScriptedDriver};
use tablesweep::sink::{IncrementalSink, MemorySink, SqliteSink};
use tablesweep::{
    NavigationOutcome, PageDriver, PageSnapshot, PaginationController, RowSnapshot,
    SessionState, TableSnapshot, TerminationReason,
};
use tokio_util::sync::CancellationToken;

const TARGET: &str = "https://reports.example.edu/view?id=7";

/// Creates a test configuration with small tables and no waiting
fn create_test_config() -> Config {
    parse_config(
        r#"
[source]
url = "https://reports.example.edu/view?id=7"

[extraction]
min-table-rows = 1

[pagination]
retry-backoff-ms = 0

[readiness]
max-attempts = 1
poll-interval-ms = 0
min-rows = 1

[output]
database-path = "unused.db"
"#,
    )
    .expect("test config is valid")
}

fn header() -> RowSnapshot {
    RowSnapshot::header(&["Dept", "Course", "Last Name", "First Name", "Term", "INS1"])
}

/// An evaluation page with one data row per course code
fn evaluation_page(courses: &[&str]) -> PageSnapshot {
    let mut rows = vec![header()];
    for course in courses {
        rows.push(RowSnapshot::data(&[
            &course[..3],
            *course,
            "Smith",
            "Alice",
            "Fall",
            "4.2",
        ]));
    }
    PageSnapshot::new(vec![TableSnapshot::from_rows(rows)])
}

fn navigation_only_page() -> PageSnapshot {
    let rows = (0..10)
        .map(|i| RowSnapshot::data(&[format!("Link {}", i)]))
        .collect();
    PageSnapshot::new(vec![TableSnapshot::from_rows(rows)])
}

#[tokio::test]
async fn test_single_page_report() {
    let driver = ScriptedDriver::new(vec![evaluation_page(&["CSC108H1", "MAT137Y1", "ANT100Y1"])]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.termination_reason, TerminationReason::NoFurtherPage);
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.total_pages_observed, 1);

    let sink = controller.sink();
    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get("Course"), Some("CSC108H1"));
    assert_eq!(records[2].get("Last Name"), Some("Smith"));
}

#[tokio::test]
async fn test_single_page_with_name_and_rating_columns() {
    let table = TableSnapshot::from_rows(vec![
        RowSnapshot::header(&["Dept", "Course", "Name", "Term", "Rating"]),
        RowSnapshot::data(&["CSC", "CSC108H1", "Smith", "Fall", "4.2"]),
        RowSnapshot::data(&["MAT", "MAT137Y1", "Jones", "Winter", "3.9"]),
        RowSnapshot::data(&["ANT", "ANT100Y1", "Nguyen", "Fall", "4.5"]),
    ]);
    let driver = ScriptedDriver::new(vec![PageSnapshot::new(vec![table])]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.termination_reason, TerminationReason::NoFurtherPage);
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.total_pages_observed, 1);

    let records = controller.sink().records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].get("Name"), Some("Jones"));
    assert_eq!(records[2].get("Rating"), Some("4.5"));
}

#[tokio::test]
async fn test_identical_second_page_is_a_stall() {
    let page = evaluation_page(&["CSC108H1", "MAT137Y1"]);
    let driver = ScriptedDriver::new(vec![page.clone(), page]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.stalls_observed, 1);
    assert_eq!(summary.pages_committed, 1);
    assert_eq!(controller.sink().pages().len(), 1);
    assert_eq!(controller.sink().pages()[0].page_number, 1);
}

#[tokio::test]
async fn test_repeating_host_ends_on_stall_limit() {
    let page = evaluation_page(&["CSC108H1"]);
    let driver = ScriptedDriver::new(vec![page]).with_end(EndBehavior::RepeatLast);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.termination_reason, TerminationReason::StallLimit);
    assert_eq!(summary.pages_committed, 1);
    assert_eq!(summary.total_pages_observed, 3);
}

#[tokio::test]
async fn test_no_table_on_first_page_fails() {
    let driver = ScriptedDriver::new(vec![PageSnapshot::empty()]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Failed);
    assert_eq!(summary.termination_reason, TerminationReason::NoDataTable);
    assert_eq!(summary.termination_reason.to_string(), "no data table located");
    assert_eq!(summary.total_records, 0);
    assert!(controller.sink().pages().is_empty());
}

#[tokio::test]
async fn test_tables_without_markers_fail_first_page() {
    let driver = ScriptedDriver::new(vec![navigation_only_page()]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.termination_reason, TerminationReason::NoDataTable);
}

#[tokio::test]
async fn test_frozen_host_terminates_within_stall_threshold() {
    let config = create_test_config();
    let driver = ScriptedDriver::new(vec![evaluation_page(&["CSC108H1"])])
        .with_end(EndBehavior::RepeatLast)
        .frozen();
    let mut controller = PaginationController::new(driver, MemorySink::new(), &config);

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.termination_reason, TerminationReason::StallLimit);
    assert!(controller.driver().navigations() <= config.pagination.stall_threshold);
    assert_eq!(summary.total_pages_observed, 1);
    // One stall per navigation that did not move, none for the refetch
    assert_eq!(summary.stalls_observed, controller.driver().navigations());
}

#[tokio::test]
async fn test_host_without_page_numbers_terminates_within_stall_threshold() {
    let config = create_test_config();
    let driver = ScriptedDriver::new(vec![evaluation_page(&["CSC108H1"])])
        .with_end(EndBehavior::RepeatLast)
        .without_page_numbers();
    let mut controller = PaginationController::new(driver, MemorySink::new(), &config);

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.termination_reason, TerminationReason::StallLimit);
    assert!(controller.driver().navigations() <= config.pagination.stall_threshold);
}

#[tokio::test]
async fn test_header_repeats_are_not_committed() {
    let page = PageSnapshot::new(vec![TableSnapshot::from_rows(vec![
        header(),
        RowSnapshot::data(&["CSC", "CSC108H1", "Smith", "Alice", "Fall", "4.2"]),
        RowSnapshot::data(&["Dept", "Course", "Last Name", "First Name", "Term", "INS1"]),
        RowSnapshot::data(&["MAT", "MAT137Y1", "Jones", "Bob", "Winter", "3.9"]),
    ])]);
    let driver = ScriptedDriver::new(vec![page]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.total_records, 2);
    assert!(controller
        .sink()
        .records()
        .iter()
        .all(|r| r.get("Dept") != Some("Dept")));
}

#[tokio::test]
async fn test_rerun_against_same_database_commits_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");
    let config = create_test_config();
    let pages = vec![
        evaluation_page(&["CSC108H1", "CSC148H1"]),
        evaluation_page(&["MAT137Y1"]),
    ];

    let first = {
        let sink = SqliteSink::new(&db_path).unwrap();
        let mut controller = PaginationController::new(ScriptedDriver::new(pages.clone()), sink, &config);
        controller.run(TARGET).await.unwrap()
    };
    assert_eq!(first.pages_committed, 2);

    let second = {
        let sink = SqliteSink::new(&db_path).unwrap();
        let mut controller = PaginationController::new(ScriptedDriver::new(pages.clone()), sink, &config);
        controller.run(TARGET).await.unwrap()
    };
    assert!(second.is_success());
    assert_eq!(second.pages_committed, 0);
    assert_eq!(second.stalls_observed, 0);

    // Without resume the pages are handed to the sink again and ignored there
    let third = {
        let sink = SqliteSink::new(&db_path).unwrap();
        let mut controller = PaginationController::new(ScriptedDriver::new(pages), sink, &config)
            .with_resume(false);
        controller.run(TARGET).await.unwrap()
    };
    assert_eq!(third.pages_committed, 2);

    let sink = SqliteSink::new(&db_path).unwrap();
    assert_eq!(sink.record_count(TARGET).unwrap(), 3);
    assert_eq!(sink.sessions().unwrap().len(), 3);

    let stored = sink.records_for_target(TARGET).unwrap();
    assert_eq!(stored[2].page_number, 2);
    assert_eq!(stored[2].record.get("Course"), Some("MAT137Y1"));
}

#[tokio::test]
async fn test_sessions_are_recorded_in_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");

    let driver = ScriptedDriver::new(vec![evaluation_page(&["CSC108H1"])]);
    let sink = SqliteSink::new(&db_path).unwrap();
    let mut controller = PaginationController::new(driver, sink, &create_test_config())
        .with_config_hash("0123abcd");

    let summary = controller.run(TARGET).await.unwrap();
    let session = controller
        .sink()
        .session(summary.session_id.unwrap())
        .unwrap();

    assert_eq!(session.config_hash, "0123abcd");
    assert_eq!(session.terminal_state.as_deref(), Some("done"));
    assert_eq!(session.termination_reason.as_deref(), Some("no_further_page"));
    assert_eq!(session.records_committed, 1);
}

#[tokio::test]
async fn test_sink_failure_keeps_earlier_pages() {
    let driver = ScriptedDriver::new(vec![
        evaluation_page(&["CSC108H1"]),
        evaluation_page(&["MAT137Y1"]),
        evaluation_page(&["ANT100Y1"]),
    ]);
    let sink = MemorySink::new().failing_after(2);
    let mut controller = PaginationController::new(driver, sink, &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Failed);
    assert_eq!(summary.termination_reason, TerminationReason::SinkFailure);
    assert_eq!(summary.pages_committed, 2);
    assert!(summary.error.is_some());
    assert_eq!(controller.sink().records().len(), 2);
}

#[tokio::test]
async fn test_sink_refusing_session_reports_failure() {
    let driver = ScriptedDriver::new(vec![evaluation_page(&["CSC108H1"])]);
    let sink = MemorySink::new().refusing_sessions();
    let mut controller = PaginationController::new(driver, sink, &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Failed);
    assert_eq!(summary.termination_reason, TerminationReason::SinkFailure);
    assert!(summary.error.is_some());
    assert_eq!(summary.total_records, 0);
    assert_eq!(controller.sink().session_count(), 0);
}

#[tokio::test]
async fn test_last_page_from_total_pages_hint() {
    let driver = ScriptedDriver::new(vec![
        evaluation_page(&["CSC108H1"]),
        evaluation_page(&["MAT137Y1"]),
        evaluation_page(&["ANT100Y1"]),
    ])
    .with_total_pages(2);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config());

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.termination_reason, TerminationReason::LastPageReached);
    assert_eq!(summary.pages_committed, 2);
}

#[tokio::test]
async fn test_max_pages_ceiling() {
    let mut config = create_test_config();
    config.pagination.max_pages = 2;
    let driver = ScriptedDriver::new(vec![
        evaluation_page(&["CSC108H1"]),
        evaluation_page(&["MAT137Y1"]),
        evaluation_page(&["ANT100Y1"]),
    ]);
    let mut controller = PaginationController::new(driver, MemorySink::new(), &config);

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.termination_reason, TerminationReason::MaxPagesReached);
    assert_eq!(summary.total_pages_observed, 2);
}

/// Scripted driver that cancels the session once it has moved past the first page
struct CancellingDriver {
    inner: ScriptedDriver,
    token: CancellationToken,
}

#[async_trait]
impl PageDriver for CancellingDriver {
    async fn load(&mut self, target: &str) -> DriverResult<()> {
        self.inner.load(target).await
    }

    async fn snapshot(&mut self) -> DriverResult<PageSnapshot> {
        self.inner.snapshot().await
    }

    async fn advance_page(&mut self) -> NavigationOutcome {
        let outcome = self.inner.advance_page().await;
        self.token.cancel();
        outcome
    }

    fn current_page_number(&self) -> Option<u32> {
        self.inner.current_page_number()
    }
}

#[tokio::test]
async fn test_cancellation_keeps_committed_pages() {
    let token = CancellationToken::new();
    let driver = CancellingDriver {
        inner: ScriptedDriver::new(vec![
            evaluation_page(&["CSC108H1"]),
            evaluation_page(&["MAT137Y1"]),
        ]),
        token: token.clone(),
    };
    let mut controller = PaginationController::new(driver, MemorySink::new(), &create_test_config())
        .with_cancellation(token);

    let summary = controller.run(TARGET).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.termination_reason, TerminationReason::Cancelled);
    assert_eq!(summary.pages_committed, 1);
    assert_eq!(controller.sink().pages().len(), 1);
}

#[tokio::test]
async fn test_sink_trait_object_sessions() {
    let mut sink: Box<dyn IncrementalSink> = Box::new(MemorySink::new());
    let first = sink.begin_session(TARGET, "a").unwrap();
    let second = sink.begin_session(TARGET, "a").unwrap();
    assert_ne!(first, second);
}
