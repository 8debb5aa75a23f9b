//! Rate Limiting Implementation
//!
//! Sliding minute and day windows in front of every upstream call.

mod limiter;
mod types;


pub use limiter::{DAY_WINDOW, MINUTE_WINDOW, SlidingWindowLimiter};
pub use types::{Admission, RateLimitStatus};
