//! Circuit breaker guarding the upstream

use super::types::{CircuitBreakerMetrics, CircuitState};
use crate::config::CircuitBreakerConfig;
use crate::utils::error::{GatewayError, Result};
use crate::utils::time::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    reopen_at: Option<Instant>,
    /// Set when a probe was let through after the open timeout
    probing: bool,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            reopen_at: None,
            probing: false,
        }
    }
}

/// Consecutive-failure circuit breaker
///
/// Opens after `failure_threshold` consecutive failures and rejects every
/// check until `timeout` has elapsed. The first check after that resets the
/// failure count and lets one probe call through; if the probe fails the
/// circuit opens again for a full timeout.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerState>,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    times_opened: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(BreakerState::closed()),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
            times_opened: AtomicU64::new(0),
        }
    }

    /// Fail fast with the remaining open time, or allow the call
    pub fn check(&self) -> Result<()> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let reopen_at = inner.reopen_at.unwrap_or(now);
                if now >= reopen_at {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.reopen_at = None;
                    inner.probing = true;
                    info!("Circuit breaker timeout elapsed, allowing probe call");
                    Ok(())
                } else {
                    let retry_after = reopen_at - now;
                    debug!("Circuit breaker open, rejecting call for another {:?}", retry_after);
                    Err(GatewayError::circuit_open(retry_after))
                }
            }
        }
    }

    /// Record a successful upstream call
    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if inner.probing {
            info!("Circuit breaker probe succeeded");
        }
        inner.consecutive_failures = 0;
        inner.probing = false;

        // A call admitted before the circuit opened may still succeed.
        if inner.state == CircuitState::Open {
            info!("Circuit breaker closing after a successful call");
            inner.state = CircuitState::Closed;
            inner.reopen_at = None;
        }
    }

    /// Record a failed upstream call
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        let now = self.clock.now();
        let threshold = self.config.failure_threshold;
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());

        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if inner.probing {
            // A failed probe reopens immediately, whatever the count.
            inner.consecutive_failures = inner.consecutive_failures.max(threshold);
            inner.probing = false;
            warn!("Circuit breaker probe failed, reopening");
        }

        if inner.consecutive_failures >= threshold {
            let reopen_at = now + self.config.timeout();
            if inner.state != CircuitState::Open {
                self.times_opened.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Circuit breaker opening after {} consecutive failures for {:?}",
                    inner.consecutive_failures,
                    self.config.timeout()
                );
            }
            inner.state = CircuitState::Open;
            inner.reopen_at = Some(reopen_at);
        } else {
            debug!(
                "Circuit breaker failure {}/{}",
                inner.consecutive_failures, threshold
            );
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        let now = self.clock.now();
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match (inner.state, inner.reopen_at) {
            (CircuitState::Open, Some(reopen_at)) if now >= reopen_at => CircuitState::Closed,
            (state, _) => state,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .consecutive_failures
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let now = self.clock.now();
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let remaining_open = match (inner.state, inner.reopen_at) {
            (CircuitState::Open, Some(reopen_at)) if now < reopen_at => Some(reopen_at - now),
            _ => None,
        };

        CircuitBreakerMetrics {
            state: if remaining_open.is_some() {
                CircuitState::Open
            } else {
                CircuitState::Closed
            },
            consecutive_failures: inner.consecutive_failures,
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            times_opened: self.times_opened.load(Ordering::Relaxed),
            remaining_open,
        }
    }

    /// Reset the circuit breaker
    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = BreakerState::closed();
        self.total_failures.store(0, Ordering::Relaxed);
        self.total_successes.store(0, Ordering::Relaxed);
        self.times_opened.store(0, Ordering::Relaxed);
        debug!("Circuit breaker reset");
    }
}
