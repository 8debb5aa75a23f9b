//! Configuration data models
//!
//! Every field carries a serde default so partial YAML files are accepted.

pub mod backoff;
pub mod batch;
pub mod circuit_breaker;
pub mod gateway;
pub mod logging;
pub mod rate_limit;
pub mod retry;

pub use backoff::*;
pub use batch::*;
pub use circuit_breaker::*;
pub use gateway::*;
pub use logging::*;
pub use rate_limit::*;
pub use retry::*;

// Default value functions

fn default_max_requests_per_minute() -> u32 {
    50
}

fn default_max_requests_per_day() -> u32 {
    1200
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_circuit_timeout_ms() -> u64 {
    60_000
}

fn default_initial_delay_ms() -> u64 {
    5_000
}

fn default_min_delay_ms() -> u64 {
    2_000
}

fn default_backoff_max_delay_ms() -> u64 {
    300_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    2_000
}

fn default_retry_max_delay_ms() -> u64 {
    60_000
}

fn default_upstream_retry_delay_ms() -> u64 {
    2_000
}

fn default_jitter_min() -> f64 {
    0.1
}

fn default_jitter_max() -> f64 {
    0.5
}

fn default_max_batch_size() -> usize {
    5
}

fn default_max_tokens_per_batch() -> usize {
    25_000
}

fn default_pre_batch_sleep_ms() -> u64 {
    10_000
}

fn default_inter_batch_sleep_ms() -> u64 {
    15_000
}

fn default_requeue_delay_ms() -> u64 {
    30_000
}

fn default_max_item_chars() -> usize {
    800
}

fn default_true() -> bool {
    true
}
