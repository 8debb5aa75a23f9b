//! Test fixtures and data factories
//!
//! Gateways built here read time from a [`ManualClock`], so every wait
//! completes instantly and is recorded.

use std::sync::Arc;
use upstream_gateway::{Gateway, GatewayConfig, ManualClock};

/// Defaults without the fixed spacing between calls
pub fn fast_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backoff.min_delay_ms = 0;
    config.backoff.initial_delay_ms = 0;
    config
}

/// A gateway on a fresh manual clock
pub fn manual_gateway(config: GatewayConfig) -> (Gateway, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let gateway = Gateway::with_clock(config, clock.clone()).expect("valid test config");
    (gateway, clock)
}

/// `n` distinct contract-style items
pub fn sample_items(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            format!(
                "Section {}: the contractor shall indemnify the client against third-party claims.",
                i + 1
            )
        })
        .collect()
}
