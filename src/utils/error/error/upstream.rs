//! Typed failures reported by the upstream client

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::utils::error::utils::ErrorUtils;

/// Keywords that mark an opaque upstream message as rate-limit shaped
const RATE_LIMIT_KEYWORDS: [&str; 5] = [
    "429",
    "rate limit",
    "quota",
    "too many requests",
    "resource exhausted",
];

/// Classification of an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    RateLimited,
    Timeout,
    Server,
    Client,
    EmptyResponse,
    Other,
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RateLimited => "rate limited",
            Self::Timeout => "timeout",
            Self::Server => "server",
            Self::Client => "client",
            Self::EmptyResponse => "empty response",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failed upstream call
///
/// Clients that see a status code should build this with
/// [`UpstreamError::from_status`]. [`UpstreamError::from_message`] is the
/// fallback for SDKs that only hand back error text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Upstream error ({kind}): {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl UpstreamError {
    pub fn new<S: Into<String>>(kind: UpstreamErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::new(UpstreamErrorKind::RateLimited, message)
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::new(UpstreamErrorKind::Timeout, message)
    }

    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::new(UpstreamErrorKind::Server, message)
    }

    pub fn client<S: Into<String>>(message: S) -> Self {
        Self::new(UpstreamErrorKind::Client, message)
    }

    pub fn empty_response() -> Self {
        Self::new(
            UpstreamErrorKind::EmptyResponse,
            "Upstream returned an empty response",
        )
    }

    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::new(UpstreamErrorKind::Other, message)
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Build from an HTTP status code
    pub fn from_status<S: Into<String>>(status: u16, message: S) -> Self {
        let message = message.into();
        let kind = match status {
            429 => UpstreamErrorKind::RateLimited,
            408 | 504 => UpstreamErrorKind::Timeout,
            500..=599 => UpstreamErrorKind::Server,
            400..=499 => UpstreamErrorKind::Client,
            _ => UpstreamErrorKind::Other,
        };
        let retry_after = ErrorUtils::extract_retry_after(&message);
        Self {
            kind,
            message,
            retry_after,
        }
    }

    /// Build from opaque error text, classifying by keyword
    pub fn from_message<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        let kind = if Self::looks_rate_limited(&message) {
            UpstreamErrorKind::RateLimited
        } else {
            let lower = message.to_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                UpstreamErrorKind::Timeout
            } else {
                UpstreamErrorKind::Other
            }
        };
        let retry_after = ErrorUtils::extract_retry_after(&message);
        Self {
            kind,
            message,
            retry_after,
        }
    }

    /// Keyword test used for opaque upstreams
    pub fn looks_rate_limited(message: &str) -> bool {
        let lower = message.to_lowercase();
        RATE_LIMIT_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    /// Typed kind first, message keywords as a fallback
    pub fn is_rate_limited(&self) -> bool {
        self.kind == UpstreamErrorKind::RateLimited
            || (self.kind == UpstreamErrorKind::Other && Self::looks_rate_limited(&self.message))
    }
}

impl From<anyhow::Error> for UpstreamError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_message(format!("{:#}", err))
    }
}
