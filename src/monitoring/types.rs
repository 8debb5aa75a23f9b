//! Usage monitoring types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Shape of a logged upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// One logical item per upstream call
    Individual,
    /// Several items combined into one upstream call
    Batch,
}

/// One upstream request as seen by the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    pub kind: RequestKind,
    pub tokens_used: u64,
    pub batch_size: usize,
    pub tokens_saved: u64,
    pub rate_limited: bool,
}

impl RequestLog {
    pub fn individual(tokens_used: u64) -> Self {
        Self {
            kind: RequestKind::Individual,
            tokens_used,
            batch_size: 1,
            tokens_saved: 0,
            rate_limited: false,
        }
    }

    pub fn batch(batch_size: usize, tokens_used: u64, tokens_saved: u64) -> Self {
        Self {
            kind: RequestKind::Batch,
            tokens_used,
            batch_size,
            tokens_saved,
            rate_limited: false,
        }
    }

    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }
}

#[derive(Debug, Clone)]
pub(super) struct UsageRecord {
    pub(super) at: Instant,
    pub(super) log: RequestLog,
}

/// Kind of failure kept in the recent-errors list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageErrorKind {
    /// A whole batch failed after its re-submission
    BatchFailure,
    /// One item of a combined response could not be parsed
    ParseFailure,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentError {
    pub timestamp: DateTime<Utc>,
    pub kind: UsageErrorKind,
    pub job_id: String,
    pub detail: String,
}

/// Point-in-time usage statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub requests_last_minute: usize,
    pub requests_last_hour: usize,
    pub requests_today: usize,
    pub tokens_last_hour: u64,
    pub rate_limit_hits: u64,
    pub total_requests: u64,
    pub total_tokens_saved: u64,
    pub avg_batch_efficiency: f64,
    pub batch_failures: u64,
    pub parse_failures: u64,
    pub optimization_score: f64,
}
