//! Time source used by every component of the gateway
//!
//! Components never call `Instant::now()` or `tokio::time::sleep` directly.
//! They go through a shared [`Clock`] so that tests can swap in a
//! [`ManualClock`] and run hour-long backoff schedules instantly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::utils::error::{GatewayError, Result};

/// Monotonic time and sleeping
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Wall-clock time, used only to stamp records and reports
    fn utc_now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for tests
///
/// `sleep` returns immediately after moving virtual time forward by the
/// requested amount, and every requested sleep is recorded.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    start_utc: DateTime<Utc>,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            start_utc: Utc::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.state.lock().offset += duration;
    }

    /// Virtual time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.state.lock().offset
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.state.lock().sleeps.iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.state.lock().offset
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let offset = self.state.lock().offset;
        chrono::Duration::from_std(offset)
            .ok()
            .and_then(|delta| self.start_utc.checked_add_signed(delta))
            .unwrap_or(self.start_utc)
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.offset += duration;
            state.sleeps.push(duration);
        }
        // Let concurrently spawned tasks observe the new time.
        tokio::task::yield_now().await;
    }
}

/// Sleep on `clock` unless `cancel` fires first
pub async fn sleep_or_cancel(
    clock: &dyn Clock,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(GatewayError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GatewayError::Cancelled),
        _ = clock.sleep(duration) => Ok(()),
    }
}
