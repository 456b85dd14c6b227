use crate::config::types::{
    Config, ExtractionConfig, OutputConfig, PaginationConfig, ReadinessConfig, SourceConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_extraction_config(&config.extraction)?;
    validate_pagination_config(&config.pagination)?;
    validate_readiness_config(&config.readiness)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the page source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid source url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source url '{}' must use http or https",
            config.url
        )));
    }

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(selector) = &config.next_selector {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid next_selector '{}': {:?}", selector, e))
        })?;
    }

    if let Some(pattern) = &config.total_pages_pattern {
        let regex = Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid total_pages_pattern: {}", e))
        })?;
        if regex.captures_len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "total_pages_pattern '{}' must contain a capture group",
                pattern
            )));
        }
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction heuristics
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.header_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "header_keywords cannot contain empty entries".to_string(),
        ));
    }

    if config.header_indicators.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "header_indicators cannot contain empty entries".to_string(),
        ));
    }

    if config.content_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "content_markers cannot contain empty entries".to_string(),
        ));
    }

    if config.fallback_columns.is_empty() {
        return Err(ConfigError::Validation(
            "fallback_columns must name at least one column".to_string(),
        ));
    }

    if config.accept_threshold == 0 {
        return Err(ConfigError::Validation(
            "accept_threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates pagination limits
fn validate_pagination_config(config: &PaginationConfig) -> Result<(), ConfigError> {
    if config.stall_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stall_threshold must be >= 1, got {}",
            config.stall_threshold
        )));
    }

    if config.navigation_failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation_failure_threshold must be >= 1, got {}",
            config.navigation_failure_threshold
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.fetch_retries > 10 || config.navigation_retries > 10 {
        return Err(ConfigError::Validation(
            "fetch_retries and navigation_retries must be <= 10".to_string(),
        ));
    }

    Ok(())
}

/// Validates readiness polling
fn validate_readiness_config(config: &ReadinessConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 30 {
        return Err(ConfigError::Validation(format!(
            "readiness max_attempts must be between 1 and 30, got {}",
            config.max_attempts
        )));
    }

    if config.poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be <= 60000ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> SourceConfig {
        SourceConfig {
            url: url.to_string(),
            page_param: "page".to_string(),
            user_agent: "tablesweep-test".to_string(),
            next_selector: None,
            total_pages_pattern: None,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_source_url() {
        assert!(validate_source_config(&source("https://example.com/report")).is_ok());
        assert!(validate_source_config(&source("http://127.0.0.1:8080/")).is_ok());

        assert!(validate_source_config(&source("not a url")).is_err());
        assert!(validate_source_config(&source("ftp://example.com/report")).is_err());
    }

    #[test]
    fn test_total_pages_pattern_needs_capture_group() {
        let mut config = source("https://example.com/");
        config.total_pages_pattern = Some(r"/ \d+".to_string());
        assert!(matches!(
            validate_source_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));

        config.total_pages_pattern = Some(r"/ (\d+)".to_string());
        assert!(validate_source_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_next_selector() {
        let mut config = source("https://example.com/");
        config.next_selector = Some("input[".to_string());
        assert!(validate_source_config(&config).is_err());
    }

    #[test]
    fn test_pagination_thresholds() {
        assert!(validate_pagination_config(&PaginationConfig::default()).is_ok());

        let config = PaginationConfig {
            stall_threshold: 0,
            ..PaginationConfig::default()
        };
        assert!(validate_pagination_config(&config).is_err());

        let config = PaginationConfig {
            max_pages: 0,
            ..PaginationConfig::default()
        };
        assert!(validate_pagination_config(&config).is_err());
    }

    #[test]
    fn test_extraction_defaults_are_valid() {
        assert!(validate_extraction_config(&ExtractionConfig::default()).is_ok());

        let config = ExtractionConfig {
            fallback_columns: vec![],
            ..ExtractionConfig::default()
        };
        assert!(validate_extraction_config(&config).is_err());
    }
}
