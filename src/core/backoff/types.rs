//! Types recorded and reported by the adaptive backoff controller

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Which upstream quota a rate-limit error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    RequestsPerMinute,
    RequestsPerDay,
    TokensPerMinute,
    ConcurrentRequests,
    Unknown,
}

impl QuotaType {
    /// Best-effort keyword classification of rate-limit error text
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("requests per minute") || lower.contains("rpm") {
            QuotaType::RequestsPerMinute
        } else if lower.contains("requests per day") || lower.contains("rpd") {
            QuotaType::RequestsPerDay
        } else if lower.contains("tokens per minute") || lower.contains("tpm") {
            QuotaType::TokensPerMinute
        } else if lower.contains("concurrent requests") {
            QuotaType::ConcurrentRequests
        } else {
            QuotaType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaType::RequestsPerMinute => "requests_per_minute",
            QuotaType::RequestsPerDay => "requests_per_day",
            QuotaType::TokensPerMinute => "tokens_per_minute",
            QuotaType::ConcurrentRequests => "concurrent_requests",
            QuotaType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rate-limit failure, never mutated after creation
#[derive(Debug, Clone)]
pub struct RateLimitEvent {
    pub timestamp: Instant,
    pub message: String,
    pub retry_after: Option<Duration>,
    pub quota_type: QuotaType,
}

/// Operator guidance derived from the failure streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Critical,
    High,
    Medium,
    Low,
    Good,
}

impl RecommendedAction {
    pub fn message(&self) -> &'static str {
        match self {
            RecommendedAction::Critical => {
                "CRITICAL: Stop all requests for 15+ minutes, check API key and quotas"
            }
            RecommendedAction::High => "HIGH: Implement long pauses between requests (5+ minutes)",
            RecommendedAction::Medium => "MEDIUM: Increase delays and reduce request frequency",
            RecommendedAction::Low => {
                "LOW: Current rate limiting is working, maintain current settings"
            }
            RecommendedAction::Good => "GOOD: API usage is stable",
        }
    }
}

/// Read-side analysis of recent rate limiting
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitAnalysis {
    pub current_delay: Duration,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub events_last_minute: usize,
    pub events_last_5_minutes: usize,
    pub events_last_hour: usize,
    pub quota_distribution: BTreeMap<QuotaType, usize>,
    /// `None` when no call has succeeded yet
    pub time_since_last_success: Option<Duration>,
    pub recommended_action: RecommendedAction,
    pub should_pause: bool,
}
