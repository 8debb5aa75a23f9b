//! Validators for the gateway configuration sections

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

/// Upper bound for the multiplicative retry jitter
const MAX_JITTER_FACTOR: f64 = 1.0;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.rate_limit.validate()?;
        self.circuit_breaker.validate()?;
        self.backoff.validate()?;
        self.retry.validate()?;
        self.batch.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_requests_per_minute == 0 {
            return Err("max_requests_per_minute must be at least 1".to_string());
        }
        if self.max_requests_per_day == 0 {
            return Err("max_requests_per_day must be at least 1".to_string());
        }
        if self.max_requests_per_minute > self.max_requests_per_day {
            debug!(
                "max_requests_per_minute ({}) exceeds max_requests_per_day ({}), the day window will bind first",
                self.max_requests_per_minute, self.max_requests_per_day
            );
        }
        Ok(())
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Circuit breaker failure_threshold must be at least 1".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Circuit breaker timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for BackoffConfig {
    fn validate(&self) -> Result<(), String> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(format!(
                "Backoff min_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            ));
        }
        if self.initial_delay_ms < self.min_delay_ms || self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "Backoff initial_delay_ms ({}) must lie between min_delay_ms ({}) and max_delay_ms ({})",
                self.initial_delay_ms, self.min_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("Retry max_retries must be at least 1".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "Retry base_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        if !(self.jitter_min >= 0.0
            && self.jitter_min <= self.jitter_max
            && self.jitter_max <= MAX_JITTER_FACTOR)
        {
            return Err(format!(
                "Retry jitter range [{}, {}] is invalid, bounds must lie within [0, {}]",
                self.jitter_min, self.jitter_max, MAX_JITTER_FACTOR
            ));
        }
        Ok(())
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 {
            return Err("Batch max_batch_size must be at least 1".to_string());
        }
        if self.max_tokens_per_batch == 0 {
            return Err("Batch max_tokens_per_batch must be at least 1".to_string());
        }
        if self.compress_items && self.max_item_chars < 16 {
            return Err(format!(
                "Batch max_item_chars ({}) is too small to compress into",
                self.max_item_chars
            ));
        }
        Ok(())
    }
}
