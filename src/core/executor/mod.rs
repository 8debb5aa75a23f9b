//! Request execution
//!
//! Composes the limiter, circuit breaker and adaptive backoff around a
//! single upstream call.

mod executor;
mod types;


pub use executor::RequestExecutor;
pub use types::RequestMeta;
