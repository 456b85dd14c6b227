//! State module for tracking session progress
//!
//! # Components
//!
//! - `SessionState`: Where the pagination state machine currently is (fetching, extracting, etc.)
//! - `PaginationState`: Page counters, stall counters and the fingerprints seen so far

mod pagination_state;
mod session_state;

// Re-export main types
pub use pagination_state::PaginationState;
pub use session_state::SessionState;
