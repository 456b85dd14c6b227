//! Page driver boundary
//!
//! A [`PageDriver`] is the only component that talks to the host serving the report. The
//! controller asks it to load the target, capture snapshots, wait for dynamic content and
//! move forward one page at a time.
//!
//! Two drivers ship with the crate:
//! - [`HttpPageDriver`] for hosts serving plain HTML addressed by a page-number parameter
//! - [`ScriptedDriver`] serving canned snapshots from memory

mod http;
mod scripted;
mod traits;

pub use http::{build_http_client, HttpPageDriver};
pub use scripted::{EndBehavior, ScriptedDriver};
pub use traits::{
    DriverError, DriverResult, NavigationOutcome, PageDriver, ReadinessPredicate, ReadinessProbe,
};
