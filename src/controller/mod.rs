//! Pagination controller
//!
//! This module contains the session state machine, including:
//! - Readiness waiting and page capture with retries
//! - Per-page extraction, fingerprinting and commit
//! - Stall detection and verified navigation
//! - Session summaries and termination reasons

mod controller;
mod retry;
mod summary;

pub use controller::PaginationController;
pub use retry::{RetryDecision, RetryPolicy};
pub use summary::{SessionSummary, TerminationReason};
