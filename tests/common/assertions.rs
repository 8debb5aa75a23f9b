//! Custom test assertions
//!
//! Domain-specific assertions for gateway results.

use std::collections::BTreeMap;
use std::time::Duration;
use upstream_gateway::{ItemResult, ItemSource};

/// Assertions for batch results
pub trait BatchResultAssertions {
    /// Assert exactly `n` entries keyed `0..n`
    fn assert_complete(&self, n: usize);

    /// Assert every entry came from `source`
    fn assert_all_from(&self, source: ItemSource);
}

impl BatchResultAssertions for BTreeMap<usize, ItemResult> {
    fn assert_complete(&self, n: usize) {
        assert_eq!(self.len(), n, "Expected {} results, got {}", n, self.len());
        assert!(
            self.keys().copied().eq(0..n),
            "Expected keys 0..{}, got {:?}",
            n,
            self.keys().collect::<Vec<_>>()
        );
    }

    fn assert_all_from(&self, source: ItemSource) {
        for (index, result) in self {
            assert_eq!(
                result.source, source,
                "Item {} came from {:?}, expected {:?}",
                index, result.source, source
            );
        }
    }
}

/// Assert some recorded sleep lasted at least `min`
pub fn assert_slept_at_least(sleeps: &[Duration], min: Duration) {
    assert!(
        sleeps.iter().any(|s| *s >= min),
        "Expected a sleep of at least {:?}, got {:?}",
        min,
        sleeps
    );
}
