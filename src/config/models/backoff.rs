//! Adaptive backoff configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds of the adaptive inter-request delay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffConfig {
    /// Delay the controller starts from
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Floor of the adaptive delay, also the fixed spacing between calls
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Ceiling of the adaptive delay
    #[serde(default = "default_backoff_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_backoff_max_delay_ms(),
        }
    }
}

impl BackoffConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
