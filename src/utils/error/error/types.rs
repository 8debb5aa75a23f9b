//! Error types for the gateway

use std::time::Duration;
use thiserror::Error;

use super::upstream::UpstreamError;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
///
/// The first three variants are capacity errors: the caller is expected to
/// pick a different user-facing message for each of them.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The day window is full; nothing succeeds until it drains
    #[error("Daily request quota exhausted, service unavailable until the window drains")]
    DailyQuotaExceeded,

    /// The circuit breaker is open and rejected the call without contacting upstream
    #[error("Upstream temporarily unavailable, retry after {}s", retry_after.as_secs())]
    CircuitOpen { retry_after: Duration },

    /// Upstream kept answering with rate-limit errors until retries ran out
    #[error("Rate limit persisted after {attempts} attempts: {message}")]
    PersistentRateLimit { attempts: u32, message: String },

    /// Non rate-limit upstream failure, surfaced with its original message
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking wait was aborted through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
