//! Rate limiter types and data structures

use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was recorded in both windows and may proceed
    Admitted,
    /// The minute window is full; nothing was recorded
    Wait(Duration),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// Wait duration, zero when admitted
    pub fn wait(&self) -> Duration {
        match self {
            Admission::Admitted => Duration::ZERO,
            Admission::Wait(d) => *d,
        }
    }
}

/// Snapshot of both windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub minute_count: u32,
    pub minute_limit: u32,
    pub remaining_minute: u32,
    pub day_count: u32,
    pub day_limit: u32,
    pub remaining_day: u32,
}

/// Admission timestamps for the trailing minute and day
#[derive(Debug, Default)]
pub(super) struct Windows {
    pub(super) minute: VecDeque<Instant>,
    pub(super) day: VecDeque<Instant>,
}

impl Windows {
    /// Drop timestamps that have left their window
    pub(super) fn prune(&mut self, now: Instant, minute: Duration, day: Duration) {
        prune_window(&mut self.minute, now, minute);
        prune_window(&mut self.day, now, day);
    }

    pub(super) fn record(&mut self, now: Instant) {
        self.minute.push_back(now);
        self.day.push_back(now);
    }

    pub(super) fn clear(&mut self) {
        self.minute.clear();
        self.day.clear();
    }
}

fn prune_window(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
    while let Some(&oldest) = window.front() {
        if now.saturating_duration_since(oldest) >= span {
            window.pop_front();
        } else {
            break;
        }
    }
}
