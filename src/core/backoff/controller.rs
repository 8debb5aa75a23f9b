//! Adaptive inter-request delay

use super::types::{QuotaType, RateLimitAnalysis, RateLimitEvent, RecommendedAction};
use crate::config::BackoffConfig;
use crate::utils::bounded::{BoundedPush, MAX_RATE_LIMIT_EVENTS};
use crate::utils::error::ErrorUtils;
use crate::utils::time::Clock;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Successes in a row before the delay starts decaying
const SUCCESS_STREAK_FOR_DECAY: u32 = 3;

/// Multiplier applied per decay step
const DECAY_FACTOR: f64 = 0.9;

/// Failures in a row that trigger a full pause
const PAUSE_FAILURE_STREAK: u32 = 5;

/// Events within `BURST_WINDOW` that trigger a full pause
const PAUSE_BURST_EVENTS: usize = 3;

const BURST_WINDOW: Duration = Duration::from_secs(60);
const BURST_PAUSE: Duration = Duration::from_secs(120);
const BASE_PAUSE: Duration = Duration::from_secs(60);
const MAX_PAUSE: Duration = Duration::from_secs(900);

/// Events older than this no longer influence the recommended delay
const RECENT_EVENT_WINDOW: Duration = Duration::from_secs(300);

const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct DelayState {
    current_delay: Duration,
    consecutive_successes: u32,
    consecutive_failures: u32,
    last_success_at: Option<Instant>,
    events: VecDeque<RateLimitEvent>,
}

/// Delay controller that ratchets up fast on rate limits and decays slowly
///
/// Every failure multiplies the delay by `1.5 + 0.2 * consecutive_failures`.
/// Once three calls in a row have succeeded, each further success takes 10%
/// off. The delay never leaves `[min_delay, max_delay]`.
#[derive(Debug)]
pub struct AdaptiveBackoffController {
    config: BackoffConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<DelayState>,
}

impl AdaptiveBackoffController {
    pub fn new(config: BackoffConfig, clock: Arc<dyn Clock>) -> Self {
        let state = Self::initial_state(&config);
        Self {
            config,
            clock,
            state: Mutex::new(state),
        }
    }

    fn initial_state(config: &BackoffConfig) -> DelayState {
        DelayState {
            current_delay: config
                .initial_delay()
                .max(config.min_delay())
                .min(config.max_delay()),
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_success_at: None,
            events: VecDeque::with_capacity(MAX_RATE_LIMIT_EVENTS),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.config.min_delay()
    }

    /// Record a rate-limit failure and grow the delay
    ///
    /// Returns the quota type recovered from `message`.
    pub fn record_failure(&self, message: &str, retry_after: Option<Duration>) -> QuotaType {
        let quota_type = QuotaType::classify(message);
        let now = self.clock.now();
        let mut state = self.state.lock();

        state.events.push_bounded(
            RateLimitEvent {
                timestamp: now,
                message: ErrorUtils::truncate_message(message, 500),
                retry_after,
                quota_type,
            },
            MAX_RATE_LIMIT_EVENTS,
        );
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.consecutive_successes = 0;

        let multiplier = 1.5 + 0.2 * f64::from(state.consecutive_failures);
        state.current_delay = state
            .current_delay
            .mul_f64(multiplier)
            .min(self.config.max_delay());

        warn!(
            "Rate limit recorded ({}), adaptive delay now {:.1}s after {} consecutive failures",
            quota_type,
            state.current_delay.as_secs_f64(),
            state.consecutive_failures
        );
        quota_type
    }

    /// Record a successful call, decaying the delay after a streak
    pub fn record_success(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        state.consecutive_successes = state.consecutive_successes.saturating_add(1);
        state.consecutive_failures = 0;
        state.last_success_at = Some(now);

        if state.consecutive_successes >= SUCCESS_STREAK_FOR_DECAY
            && state.current_delay > self.config.min_delay()
        {
            state.current_delay = state
                .current_delay
                .mul_f64(DECAY_FACTOR)
                .max(self.config.min_delay());
            debug!(
                "Reducing adaptive delay to {:.1}s after sustained success",
                state.current_delay.as_secs_f64()
            );
        }
    }

    /// Delay to observe before the next upstream call
    pub fn recommended_delay(&self) -> Duration {
        let now = self.clock.now();
        let state = self.state.lock();

        let latest_recent = state
            .events
            .back()
            .filter(|e| now.saturating_duration_since(e.timestamp) < RECENT_EVENT_WINDOW);

        match latest_recent {
            Some(event) => match event.retry_after {
                Some(retry_after) => retry_after.max(state.current_delay),
                None => state.current_delay,
            },
            None => self.config.min_delay(),
        }
    }

    /// Full-stop pause above the per-request delay, if one is due
    pub fn should_pause_all(&self) -> Option<Duration> {
        let now = self.clock.now();
        let state = self.state.lock();
        Self::pause_for(&state, now)
    }

    fn pause_for(state: &DelayState, now: Instant) -> Option<Duration> {
        if state.consecutive_failures >= PAUSE_FAILURE_STREAK {
            // 60 * 2^4 already exceeds the 900s cap
            let exponent = (state.consecutive_failures - PAUSE_FAILURE_STREAK).min(4);
            let pause = (BASE_PAUSE * 2u32.pow(exponent)).min(MAX_PAUSE);
            info!(
                "Pausing all requests for {:?} after {} consecutive failures",
                pause, state.consecutive_failures
            );
            return Some(pause);
        }

        let burst = count_since(&state.events, now, BURST_WINDOW);
        if burst >= PAUSE_BURST_EVENTS {
            info!(
                "Pausing all requests for {:?} after {} rate limits in the last minute",
                BURST_PAUSE, burst
            );
            return Some(BURST_PAUSE);
        }

        None
    }

    pub fn current_delay(&self) -> Duration {
        self.state.lock().current_delay
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    /// Snapshot of the recent rate-limit history
    pub fn analysis(&self) -> RateLimitAnalysis {
        let now = self.clock.now();
        let state = self.state.lock();

        let mut quota_distribution = BTreeMap::new();
        for event in state
            .events
            .iter()
            .filter(|e| now.saturating_duration_since(e.timestamp) < HOUR)
        {
            *quota_distribution.entry(event.quota_type).or_insert(0) += 1;
        }

        let recommended_action = if state.consecutive_failures >= 10 {
            RecommendedAction::Critical
        } else if state.consecutive_failures >= 5 {
            RecommendedAction::High
        } else if state.consecutive_failures >= 3 {
            RecommendedAction::Medium
        } else if state.current_delay > Duration::from_secs(30) {
            RecommendedAction::Low
        } else {
            RecommendedAction::Good
        };

        let should_pause = state.consecutive_failures >= PAUSE_FAILURE_STREAK
            || count_since(&state.events, now, BURST_WINDOW) >= PAUSE_BURST_EVENTS;

        RateLimitAnalysis {
            current_delay: state.current_delay,
            consecutive_failures: state.consecutive_failures,
            consecutive_successes: state.consecutive_successes,
            events_last_minute: count_since(&state.events, now, BURST_WINDOW),
            events_last_5_minutes: count_since(&state.events, now, RECENT_EVENT_WINDOW),
            events_last_hour: count_since(&state.events, now, HOUR),
            quota_distribution,
            time_since_last_success: state
                .last_success_at
                .map(|t| now.saturating_duration_since(t)),
            recommended_action,
            should_pause,
        }
    }

    /// Markdown rendering of [`Self::analysis`]
    pub fn report(&self) -> String {
        super::report::render(&self.analysis(), self.clock.utc_now())
    }

    /// Forget all history and return to the initial delay
    pub fn reset(&self) {
        *self.state.lock() = Self::initial_state(&self.config);
        debug!("Adaptive backoff controller reset");
    }
}

fn count_since(events: &VecDeque<RateLimitEvent>, now: Instant, span: Duration) -> usize {
    events
        .iter()
        .filter(|e| now.saturating_duration_since(e.timestamp) < span)
        .count()
}
