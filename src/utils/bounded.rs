//! Bounded collection helpers for telemetry buffers

use std::collections::VecDeque;

/// Rate-limit events kept for analysis
pub(crate) const MAX_RATE_LIMIT_EVENTS: usize = 100;

/// Hard cap on usage records, independent of the time-based pruning
pub(crate) const MAX_USAGE_RECORDS: usize = 10_000;

/// Recent errors kept for diagnostics
pub(crate) const MAX_RECENT_ERRORS: usize = 100;

/// Helper trait for bounded VecDeque operations
pub(crate) trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T, max_size: usize);
}

impl<T> BoundedPush<T> for VecDeque<T> {
    /// Push a value while maintaining a maximum size (O(1) amortized)
    #[inline]
    fn push_bounded(&mut self, value: T, max_size: usize) {
        if max_size == 0 {
            return;
        }
        while self.len() >= max_size {
            self.pop_front();
        }
        self.push_back(value);
    }
}
