//! Core functionality for the gateway
//!
//! The admission, resilience and scheduling components that sit between
//! callers and the upstream. Each component is constructed once and shared
//! by every caller through the [`Gateway`](crate::Gateway).

pub mod backoff; // Adaptive delay and pause-all decisions
pub mod batch; // Combined prompts for many items
pub mod executor; // One rate-governed upstream call
pub mod rate_limiter; // Sliding minute and day windows
pub mod upstream;

pub use backoff::AdaptiveBackoffController;
pub use batch::{AnalysisKind, BatchOutcome, BatchReport, BatchScheduler, ItemResult};
pub use executor::{RequestExecutor, RequestMeta};
pub use rate_limiter::SlidingWindowLimiter;
pub use upstream::UpstreamClient;
