//! Types for error recovery patterns

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Circuit breaker state
///
/// There is no half-open state: once the open timeout elapses the next
/// check lets a single probe through with the circuit closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
        }
    }
}

/// Circuit breaker metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    /// Current circuit breaker state
    pub state: CircuitState,
    /// Number of consecutive failures
    pub consecutive_failures: u32,
    /// Failures recorded since creation or reset
    pub total_failures: u64,
    /// Successes recorded since creation or reset
    pub total_successes: u64,
    /// How many times the circuit has opened
    pub times_opened: u64,
    /// Time left until a probe is allowed, when open
    pub remaining_open: Option<Duration>,
}
