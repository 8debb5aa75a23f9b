//! Exponential backoff with multiplicative jitter

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Source of the jitter factor applied on top of a backoff delay
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// A factor in `[min, max]`
    fn factor(&self, min: f64, max: f64) -> f64;
}

/// Uniformly random jitter
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn factor(&self, min: f64, max: f64) -> f64 {
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Always returns the same factor, clamped into the requested range
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn factor(&self, min: f64, max: f64) -> f64 {
        self.0.clamp(min, max.max(min))
    }
}

/// Retry schedule for upstream calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    jitter: Arc<dyn JitterSource>,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: RetryConfig) -> Self {
        Self::with_jitter(config, Arc::new(RandomJitter))
    }

    pub fn with_jitter(config: RetryConfig, jitter: Arc<dyn JitterSource>) -> Self {
        Self { config, jitter }
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Pause before the single retry of a non rate-limit failure
    pub fn upstream_retry_delay(&self) -> Duration {
        self.config.upstream_retry_delay()
    }

    /// `min(base * 2^attempt, max)` without jitter
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.config
            .base_delay()
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.config.max_delay())
    }

    /// Backoff for the given zero-based attempt, jitter included
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay = self.base_backoff(attempt);
        let factor = self
            .jitter
            .factor(self.config.jitter_min, self.config.jitter_max);
        delay + delay.mul_f64(factor)
    }
}
