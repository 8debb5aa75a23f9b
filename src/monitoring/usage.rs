//! Passive usage accounting
//!
//! Nothing in here feeds back into admission, breaking or backoff decisions.

use super::report;
use super::types::{
    RecentError, RequestLog, UsageErrorKind, UsageRecord, UsageSnapshot,
};
use crate::utils::bounded::{BoundedPush, MAX_RECENT_ERRORS, MAX_USAGE_RECORDS};
use crate::utils::time::Clock;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86_400);

#[derive(Debug, Default)]
struct UsageState {
    records: VecDeque<UsageRecord>,
    recent_errors: VecDeque<RecentError>,
    total_requests: u64,
    rate_limit_hits: u64,
    total_tokens_saved: u64,
    batch_failures: u64,
    parse_failures: u64,
}

/// Request, token and batching statistics
#[derive(Debug)]
pub struct UsageMonitor {
    clock: Arc<dyn Clock>,
    state: RwLock<UsageState>,
}

impl UsageMonitor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(UsageState::default()),
        }
    }

    /// Log one upstream request
    pub fn log_request(&self, log: RequestLog) {
        let now = self.clock.now();
        let mut state = self.state.write();

        state.total_requests += 1;
        state.total_tokens_saved += log.tokens_saved;
        if log.rate_limited {
            state.rate_limit_hits += 1;
        }

        debug!(
            "Usage: {:?} request, {} tokens, batch of {}, {} saved, rate limited: {}",
            log.kind, log.tokens_used, log.batch_size, log.tokens_saved, log.rate_limited
        );

        state
            .records
            .push_bounded(UsageRecord { at: now, log }, MAX_USAGE_RECORDS);
        prune(&mut state.records, now);
    }

    /// A batch failed for good and its items fell back
    pub fn record_batch_failure(&self, job_id: &str, error: &str) {
        let error = self.recent_error(UsageErrorKind::BatchFailure, job_id, error.to_string());
        let mut state = self.state.write();
        state.batch_failures += 1;
        state.recent_errors.push_bounded(error, MAX_RECENT_ERRORS);
    }

    /// One item of a combined response could not be parsed
    pub fn record_parse_failure(&self, job_id: &str, position: usize) {
        let error = self.recent_error(
            UsageErrorKind::ParseFailure,
            job_id,
            format!("ITEM_{} fell back to the default result", position),
        );
        let mut state = self.state.write();
        state.parse_failures += 1;
        state.recent_errors.push_bounded(error, MAX_RECENT_ERRORS);
    }

    fn recent_error(&self, kind: UsageErrorKind, job_id: &str, detail: String) -> RecentError {
        RecentError {
            timestamp: self.clock.utc_now(),
            kind,
            job_id: job_id.to_string(),
            detail,
        }
    }

    pub fn recent_errors(&self) -> Vec<RecentError> {
        self.state.read().recent_errors.iter().cloned().collect()
    }

    pub fn current_usage(&self) -> UsageSnapshot {
        let now = self.clock.now();
        let state = self.state.read();

        let records = &state.records;
        let within = move |span: Duration| {
            records
                .iter()
                .filter(move |r| now.saturating_duration_since(r.at) < span)
        };

        let recent_batches: Vec<f64> = within(HOUR)
            .filter(|r| r.log.batch_size > 1)
            .map(|r| r.log.batch_size as f64)
            .collect();
        let avg_batch_efficiency = average(&recent_batches);

        UsageSnapshot {
            requests_last_minute: within(MINUTE).count(),
            requests_last_hour: within(HOUR).count(),
            requests_today: within(DAY).count(),
            tokens_last_hour: within(HOUR).map(|r| r.log.tokens_used).sum(),
            rate_limit_hits: state.rate_limit_hits,
            total_requests: state.total_requests,
            total_tokens_saved: state.total_tokens_saved,
            avg_batch_efficiency,
            batch_failures: state.batch_failures,
            parse_failures: state.parse_failures,
            optimization_score: score(&state, now),
        }
    }

    /// 0 to 100, higher is better
    pub fn optimization_score(&self) -> f64 {
        let now = self.clock.now();
        score(&self.state.read(), now)
    }

    /// Human-readable suggestions derived from the current usage
    pub fn recommendations(&self) -> Vec<String> {
        report::recommendations(&self.current_usage())
    }

    /// Markdown usage report
    pub fn report(&self) -> String {
        let usage = self.current_usage();
        report::render(&usage, &report::recommendations(&usage), self.clock.utc_now())
    }

    pub fn reset(&self) {
        *self.state.write() = UsageState::default();
        debug!("Usage monitor reset");
    }
}

fn prune(records: &mut VecDeque<UsageRecord>, now: Instant) {
    while let Some(oldest) = records.front() {
        if now.saturating_duration_since(oldest.at) >= DAY {
            records.pop_front();
        } else {
            break;
        }
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// `100 - 30 * hit_ratio + min(20, 10 * efficiency) + min(10, saved / 1000)`
fn score(state: &UsageState, now: Instant) -> f64 {
    let mut score = 100.0;

    if state.total_requests > 0 {
        let ratio = state.rate_limit_hits as f64 / state.total_requests as f64;
        score -= ratio * 30.0;
    }

    let efficiencies: Vec<f64> = state
        .records
        .iter()
        .filter(|r| r.log.batch_size > 1 && now.saturating_duration_since(r.at) < DAY)
        .map(|r| r.log.batch_size as f64)
        .collect();
    if !efficiencies.is_empty() {
        score += (average(&efficiencies) * 10.0).min(20.0);
    }

    if state.total_tokens_saved > 0 {
        score += (state.total_tokens_saved as f64 / 1000.0).min(10.0);
    }

    score.clamp(0.0, 100.0)
}
