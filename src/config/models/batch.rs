//! Batch scheduling configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits and pacing for combined upstream requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Items per combined request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Estimated prompt tokens per combined request (4 chars per token)
    #[serde(default = "default_max_tokens_per_batch")]
    pub max_tokens_per_batch: usize,
    /// Pause before every submission
    #[serde(default = "default_pre_batch_sleep_ms")]
    pub pre_batch_sleep_ms: u64,
    /// Pause between two successive batches
    #[serde(default = "default_inter_batch_sleep_ms")]
    pub inter_batch_sleep_ms: u64,
    /// Pause before the single re-submission of a failed batch
    #[serde(default = "default_requeue_delay_ms")]
    pub requeue_delay_ms: u64,
    /// Items longer than this are compressed before prompting
    #[serde(default = "default_max_item_chars")]
    pub max_item_chars: usize,
    /// Compress long items at all
    #[serde(default = "default_true")]
    pub compress_items: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_tokens_per_batch: default_max_tokens_per_batch(),
            pre_batch_sleep_ms: default_pre_batch_sleep_ms(),
            inter_batch_sleep_ms: default_inter_batch_sleep_ms(),
            requeue_delay_ms: default_requeue_delay_ms(),
            max_item_chars: default_max_item_chars(),
            compress_items: default_true(),
        }
    }
}

impl BatchConfig {
    pub fn pre_batch_sleep(&self) -> Duration {
        Duration::from_millis(self.pre_batch_sleep_ms)
    }

    pub fn inter_batch_sleep(&self) -> Duration {
        Duration::from_millis(self.inter_batch_sleep_ms)
    }

    pub fn requeue_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_delay_ms)
    }
}
