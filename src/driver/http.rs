//! HTTP page driver
//!
//! This module drives hosts whose report pages are plain HTML addressed by a page-number
//! query parameter:
//! - Building the HTTP client with the configured user agent and timeout
//! - Fetching a page and classifying failures as transient, permanent or not found
//! - Reading the total-pages indicator and the next-page control from each page
//!
//! Page N of `https://host/report?id=7` is `https://host/report?id=7&page=N`. A missing page
//! (HTTP 404) ends the pagination.

use crate::config::SourceConfig;
use crate::driver::{DriverError, DriverResult, NavigationOutcome, PageDriver};
use crate::snapshot::{parse_snapshot, PageSnapshot};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Builds an HTTP client for the configured source
///
/// # Arguments
///
/// * `config` - The source configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The page the driver is positioned on
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    page_number: u32,
    body: String,
    total_pages: Option<u32>,
    has_next: Option<bool>,
}

/// Page driver over plain HTTP
#[derive(Debug)]
pub struct HttpPageDriver {
    client: Client,
    page_param: String,
    next_selector: Option<String>,
    total_pages_pattern: Option<Regex>,
    current: Option<LoadedPage>,
}

impl HttpPageDriver {
    /// Creates a driver from the source configuration
    ///
    /// Fails if the HTTP client cannot be built or the total-pages pattern does not compile.
    pub fn new(config: &SourceConfig) -> crate::Result<Self> {
        let client = build_http_client(config)?;
        let total_pages_pattern = config
            .total_pages_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| crate::ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            client,
            page_param: config.page_param.clone(),
            next_selector: config.next_selector.clone(),
            total_pages_pattern,
            current: None,
        })
    }

    /// URL of the page the driver is positioned on
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    async fn open(&self, url: Url, page_number: u32) -> DriverResult<LoadedPage> {
        let body = fetch_page(&self.client, &url).await?;
        let (total_pages, has_next) = self.read_indicators(&body);
        debug!(
            "Loaded page {} from {} (total: {:?}, next: {:?})",
            page_number, url, total_pages, has_next
        );

        Ok(LoadedPage {
            url,
            page_number,
            body,
            total_pages,
            has_next,
        })
    }

    /// Reads the total-pages indicator and the next-page control from a page body
    fn read_indicators(&self, body: &str) -> (Option<u32>, Option<bool>) {
        if self.total_pages_pattern.is_none() && self.next_selector.is_none() {
            return (None, None);
        }

        let document = Html::parse_document(body);

        let total_pages = self.total_pages_pattern.as_ref().and_then(|pattern| {
            let text = document
                .root_element()
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            pattern
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        });

        let has_next = self
            .next_selector
            .as_deref()
            .and_then(|s| Selector::parse(s).ok())
            .map(|selector| document.select(&selector).next().is_some());

        (total_pages, has_next)
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn load(&mut self, target: &str) -> DriverResult<()> {
        let url = Url::parse(target).map_err(|e| DriverError::InvalidTarget(e.to_string()))?;
        let page_number = page_number_of(&url, &self.page_param).unwrap_or(1);

        self.current = Some(self.open(url, page_number).await?);
        Ok(())
    }

    async fn snapshot(&mut self) -> DriverResult<PageSnapshot> {
        let page = self.current.as_ref().ok_or(DriverError::NotLoaded)?;
        Ok(parse_snapshot(&page.body))
    }

    async fn advance_page(&mut self) -> NavigationOutcome {
        let Some(page) = self.current.as_ref() else {
            return NavigationOutcome::Failed;
        };

        let next_number = page.page_number + 1;
        let next_url = with_page_number(&page.url, &self.page_param, next_number);

        match self.open(next_url, next_number).await {
            Ok(next) => {
                self.current = Some(next);
                NavigationOutcome::Succeeded
            }
            Err(DriverError::NotFound(url)) => {
                debug!("No page at {}", url);
                NavigationOutcome::NoFurtherPage
            }
            Err(e) => {
                warn!("Navigation to page {} failed: {}", next_number, e);
                NavigationOutcome::Failed
            }
        }
    }

    fn current_page_number(&self) -> Option<u32> {
        self.current.as_ref().map(|page| page.page_number)
    }

    fn total_pages_hint(&self) -> Option<u32> {
        self.current.as_ref().and_then(|page| page.total_pages)
    }

    fn has_next_page(&self) -> Option<bool> {
        self.current.as_ref().and_then(|page| page.has_next)
    }
}

/// Fetches a page body, classifying failures
///
/// | Condition | Error |
/// |-----------|-------|
/// | HTTP 404 | NotFound |
/// | HTTP 429, HTTP 5xx | Transient |
/// | Timeout, connection failure | Transient |
/// | Other HTTP errors | Permanent |
/// | Non-HTML Content-Type | Permanent |
async fn fetch_page(client: &Client, url: &Url) -> DriverResult<String> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            DriverError::Transient(format!("Request timeout: {}", url))
        } else if e.is_connect() {
            DriverError::Transient(format!("Connection failed: {}", url))
        } else {
            DriverError::Permanent(e.to_string())
        }
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(DriverError::NotFound(url.to_string()));
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(DriverError::Transient(format!("HTTP {} from {}", status.as_u16(), url)));
    }
    if !status.is_success() {
        return Err(DriverError::Permanent(format!("HTTP {} from {}", status.as_u16(), url)));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.is_empty() && !content_type.contains("html") {
        return Err(DriverError::Permanent(format!(
            "Content mismatch: {} served {}",
            url, content_type
        )));
    }

    response
        .text()
        .await
        .map_err(|e| DriverError::Transient(e.to_string()))
}

/// Page number carried by the URL's page parameter, if any
fn page_number_of(url: &Url, page_param: &str) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| key == page_param)
        .and_then(|(_, value)| value.parse().ok())
}

/// Copy of `url` with the page parameter set to `page`
fn with_page_number(url: &Url, page_param: &str, page: u32) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != page_param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(page_param, &page.to_string());
    next
}
