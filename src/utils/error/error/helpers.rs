//! Helper functions for creating and inspecting errors

use std::time::Duration;

use super::types::GatewayError;

impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn circuit_open(retry_after: Duration) -> Self {
        Self::CircuitOpen { retry_after }
    }

    pub fn persistent_rate_limit<S: Into<String>>(attempts: u32, message: S) -> Self {
        Self::PersistentRateLimit {
            attempts,
            message: message.into(),
        }
    }

    /// True for the errors caused by running out of upstream capacity
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            Self::DailyQuotaExceeded | Self::CircuitOpen { .. } | Self::PersistentRateLimit { .. }
        )
    }

    /// How long the caller should wait before trying again, when known
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::CircuitOpen { retry_after } => Some(*retry_after),
            Self::Upstream(err) => err.retry_after,
            _ => None,
        }
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::DailyQuotaExceeded => "daily_quota_exceeded",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::PersistentRateLimit { .. } => "persistent_rate_limit",
            Self::Upstream(_) => "upstream_error",
            Self::Config(_) => "config_error",
            Self::Cancelled => "cancelled",
            Self::Serialization(_) => "serialization_error",
            Self::Yaml(_) => "yaml_error",
            Self::Io(_) => "io_error",
        }
    }
}
