//! Sliding-window admission control

use super::types::{Admission, RateLimitStatus, Windows};
use crate::config::RateLimitConfig;
use crate::utils::error::{GatewayError, Result};
use crate::utils::time::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Span of the minute window
pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);

/// Span of the day window
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Wait is measured against this span so the oldest record has surely left
const MINUTE_WAIT_SPAN: Duration = Duration::from_secs(61);

/// Two-window sliding limiter shared by every caller of the gateway
///
/// The whole admit operation (prune, check, record) runs under one lock so
/// that two callers racing for the last slot cannot both take it.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<Windows>,
}

impl SlidingWindowLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Atomically check both windows and record the request if it fits
    ///
    /// A full day window is fatal. A full minute window yields the time until
    /// its oldest record leaves, and the caller must sleep and try again.
    pub fn admit(&self) -> Result<Admission> {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        windows.prune(now, MINUTE_WINDOW, DAY_WINDOW);

        if windows.day.len() >= self.config.max_requests_per_day as usize {
            error!(
                "Daily request quota exhausted ({}/{})",
                windows.day.len(),
                self.config.max_requests_per_day
            );
            return Err(GatewayError::DailyQuotaExceeded);
        }

        if windows.minute.len() >= self.config.max_requests_per_minute as usize {
            if let Some(&oldest) = windows.minute.front() {
                let wait = MINUTE_WAIT_SPAN.saturating_sub(now.saturating_duration_since(oldest));
                debug!(
                    "Minute limit reached ({}/{}), caller must wait {:?}",
                    windows.minute.len(),
                    self.config.max_requests_per_minute,
                    wait
                );
                return Ok(Admission::Wait(wait));
            }
        }

        windows.record(now);
        Ok(Admission::Admitted)
    }

    /// Current window occupancy
    pub fn status(&self) -> RateLimitStatus {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        windows.prune(now, MINUTE_WINDOW, DAY_WINDOW);

        let minute_count = windows.minute.len() as u32;
        let day_count = windows.day.len() as u32;
        RateLimitStatus {
            minute_count,
            minute_limit: self.config.max_requests_per_minute,
            remaining_minute: self.config.max_requests_per_minute.saturating_sub(minute_count),
            day_count,
            day_limit: self.config.max_requests_per_day,
            remaining_day: self.config.max_requests_per_day.saturating_sub(day_count),
        }
    }

    /// Forget every recorded request
    pub fn reset(&self) {
        self.windows.lock().clear();
        debug!("Sliding window limiter reset");
    }
}
