//! Error recovery and resilience utilities
//!
//! Circuit breaking and the retry schedule used by the request executor.

mod circuit_breaker;
mod retry;
mod types;

pub use circuit_breaker::CircuitBreaker;
pub use retry::{FixedJitter, JitterSource, RandomJitter, RetryPolicy};
pub use types::{CircuitBreakerMetrics, CircuitState};
