//! Tablesweep: adaptive table extraction across paginated report pages
//!
//! This crate locates the data table on pages whose layout is not known in advance,
//! infers a column schema, validates rows, and drives pagination to completion while
//! committing every page to a durable sink as soon as it is extracted.

pub mod config;
pub mod controller;
pub mod driver;
pub mod extract;
pub mod output;
pub mod sink;
pub mod snapshot;
pub mod state;

use thiserror::Error;

/// Main error type for Tablesweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SessionState,
        to: state::SessionState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Tablesweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use controller::{PaginationController, SessionSummary, TerminationReason};
pub use driver::{NavigationOutcome, PageDriver};
pub use extract::{Record, Schema};
pub use sink::IncrementalSink;
pub use snapshot::{PageSnapshot, RowSnapshot, TableSnapshot};
pub use state::{PaginationState, SessionState};
