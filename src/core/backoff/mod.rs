//! Adaptive backoff
//!
//! Tunes the spacing between upstream calls from the observed rate limits and
//! decides when every caller should stop for a while.

mod controller;
mod report;
mod types;


pub use controller::AdaptiveBackoffController;
pub use types::{QuotaType, RateLimitAnalysis, RateLimitEvent, RecommendedAction};
