//! Integration tests for the HTTP page driver
//!
//! These tests use wiremock to serve report pages and check page loading,
//! navigation and failure classification, then run a full session over HTTP.

use tablesweep::config::{parse_config, SourceConfig};
use tablesweep::driver::{DriverError, HttpPageDriver};
use tablesweep::sink::SqliteSink;
use tablesweep::{NavigationOutcome, PageDriver, PaginationController, SessionState, TerminationReason};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_config(base_url: &str) -> SourceConfig {
    SourceConfig {
        url: format!("{}/view?id=7", base_url),
        page_param: "page".to_string(),
        user_agent: "TestSweep/1.0".to_string(),
        next_selector: Some("a.next".to_string()),
        total_pages_pattern: Some(r"Page \d+ of (\d+)".to_string()),
        request_timeout_secs: 5,
    }
}

/// Renders a report page with one row per course
fn report_page(page: u32, total: u32, courses: &[&str]) -> String {
    let rows: String = courses
        .iter()
        .map(|course| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>Smith</td><td>Alice</td><td>Fall</td><td>4.2</td></tr>",
                &course[..3],
                course
            )
        })
        .collect();
    let next = if page < total {
        format!(r#"<a class="next" href="?id=7&page={}">Next</a>"#, page + 1)
    } else {
        String::new()
    };

    format!(
        r#"<html><head><title>Course Evaluations</title></head><body>
        <table class="layout"><tr><td><a href="/">Home</a></td></tr></table>
        <table class="results">
          <tr><th>Dept</th><th>Course</th><th>Last Name</th><th>First Name</th><th>Term</th><th>INS1</th></tr>
          {}
        </table>
        <p>Page {} of {}</p>
        {}
        </body></html>"#,
        rows, page, total, next
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_load_and_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(html(report_page(1, 3, &["CSC108H1", "MAT137Y1"])))
        .mount(&mock_server)
        .await;

    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();
    driver
        .load(&format!("{}/view?id=7", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(driver.current_page_number(), Some(1));
    assert_eq!(driver.total_pages_hint(), Some(3));
    assert_eq!(driver.has_next_page(), Some(true));

    let snapshot = driver.snapshot().await.unwrap();
    assert_eq!(snapshot.tables.len(), 2);
    assert_eq!(snapshot.tables[1].row_count(), 3);
    assert!(snapshot.tables[1].raw_text.contains("MAT137Y1"));
}

#[tokio::test]
async fn test_advance_requests_next_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("page", "2"))
        .respond_with(html(report_page(2, 2, &["ANT100Y1"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(html(report_page(1, 2, &["CSC108H1"])))
        .mount(&mock_server)
        .await;

    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();
    driver
        .load(&format!("{}/view?id=7", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(driver.advance_page().await, NavigationOutcome::Succeeded);
    assert_eq!(driver.current_page_number(), Some(2));
    assert_eq!(driver.has_next_page(), Some(false));
    assert_eq!(
        driver.current_url().map(|u| u.query().unwrap_or("").to_string()),
        Some("id=7&page=2".to_string())
    );

    let snapshot = driver.snapshot().await.unwrap();
    assert!(snapshot.tables[1].raw_text.contains("ANT100Y1"));
}

#[tokio::test]
async fn test_missing_page_is_no_further_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(html(report_page(1, 1, &["CSC108H1"])))
        .mount(&mock_server)
        .await;

    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();
    driver
        .load(&format!("{}/view?id=7", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(driver.advance_page().await, NavigationOutcome::NoFurtherPage);
    assert_eq!(driver.current_page_number(), Some(1));
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(html(report_page(1, 2, &["CSC108H1"])))
        .mount(&mock_server)
        .await;

    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();

    let err = driver
        .load(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(err.is_transient());

    driver
        .load(&format!("{}/view?id=7", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(driver.advance_page().await, NavigationOutcome::Failed);
    assert_eq!(driver.current_page_number(), Some(1));
}

#[tokio::test]
async fn test_non_html_content_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();

    let err = driver
        .load(&format!("{}/export", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Permanent(_)));

    let err = driver
        .load(&format!("{}/forbidden", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Permanent(_)));
}

#[tokio::test]
async fn test_invalid_target() {
    let mock_server = MockServer::start().await;
    let mut driver = HttpPageDriver::new(&source_config(&mock_server.uri())).unwrap();

    let err = driver.load("not a url").await.unwrap_err();
    assert!(matches!(err, DriverError::InvalidTarget(_)));
}

#[tokio::test]
async fn test_full_session_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("page", "2"))
        .respond_with(html(report_page(2, 2, &["ANT100Y1"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(html(report_page(1, 2, &["CSC108H1", "MAT137Y1"])))
        .mount(&mock_server)
        .await;

    let config = parse_config(&format!(
        r#"
[source]
url = "{}/view?id=7"
next-selector = "a.next"
total-pages-pattern = 'Page \d+ of (\d+)'

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
        base_url
    ))
    .unwrap();

    let driver = HttpPageDriver::new(&config.source).unwrap();
    let sink = SqliteSink::new_in_memory().unwrap();
    let mut controller = PaginationController::new(driver, sink, &config);

    let summary = controller.run(&config.source.url).await.unwrap();

    assert_eq!(summary.terminal_state, SessionState::Done);
    assert_eq!(summary.termination_reason, TerminationReason::LastPageReached);
    assert_eq!(summary.total_pages_observed, 2);
    assert_eq!(summary.total_records, 3);

    let stored = controller
        .sink()
        .records_for_target(&config.source.url)
        .unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].page_number, 2);
    assert_eq!(stored[2].record.get("Course"), Some("ANT100Y1"));
}
