//! Retry configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Attempts allowed while the upstream keeps rate limiting
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base of the exponential backoff
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap applied before jitter
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Fixed pause before the single retry of a non rate-limit failure
    #[serde(default = "default_upstream_retry_delay_ms")]
    pub upstream_retry_delay_ms: u64,
    /// Lower bound of the multiplicative jitter factor
    #[serde(default = "default_jitter_min")]
    pub jitter_min: f64,
    /// Upper bound of the multiplicative jitter factor
    #[serde(default = "default_jitter_max")]
    pub jitter_max: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_retry_base_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
            upstream_retry_delay_ms: default_upstream_retry_delay_ms(),
            jitter_min: default_jitter_min(),
            jitter_max: default_jitter_max(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn upstream_retry_delay(&self) -> Duration {
        Duration::from_millis(self.upstream_retry_delay_ms)
    }
}
