//! Monitoring
//!
//! Usage accounting for diagnostics. Read-only from the control path's
//! point of view.

mod report;
mod types;
mod usage;

pub use types::{RecentError, RequestKind, RequestLog, UsageErrorKind, UsageSnapshot};
pub use usage::UsageMonitor;
