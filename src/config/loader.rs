//! Configuration loading utilities
//!
//! YAML text and `GATEWAY_*` environment variables.

use super::models::*;
use crate::utils::error::{GatewayError, Result};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Parse one override, naming the variable in the error
fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| GatewayError::config(format!("Invalid {}: {}", name, e)))
}

impl GatewayConfig {
    /// Parse YAML text; absent keys keep their defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))
    }

    /// Read a YAML file, then overlay environment variables
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overlay `GATEWAY_*` environment variables onto this configuration
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Overlay values found through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GATEWAY_MAX_REQUESTS_PER_MINUTE") {
            self.rate_limit.max_requests_per_minute =
                parse_var("GATEWAY_MAX_REQUESTS_PER_MINUTE", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_MAX_REQUESTS_PER_DAY") {
            self.rate_limit.max_requests_per_day = parse_var("GATEWAY_MAX_REQUESTS_PER_DAY", &v)?;
        }

        if let Some(v) = lookup("GATEWAY_CIRCUIT_BREAKER_FAILURES") {
            self.circuit_breaker.failure_threshold =
                parse_var("GATEWAY_CIRCUIT_BREAKER_FAILURES", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_CIRCUIT_BREAKER_TIMEOUT_MS") {
            self.circuit_breaker.timeout_ms = parse_var("GATEWAY_CIRCUIT_BREAKER_TIMEOUT_MS", &v)?;
        }

        if let Some(v) = lookup("GATEWAY_MIN_DELAY_MS") {
            self.backoff.min_delay_ms = parse_var("GATEWAY_MIN_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_MAX_DELAY_MS") {
            self.backoff.max_delay_ms = parse_var("GATEWAY_MAX_DELAY_MS", &v)?;
        }

        if let Some(v) = lookup("GATEWAY_MAX_BATCH_SIZE") {
            self.batch.max_batch_size = parse_var("GATEWAY_MAX_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_MAX_TOKENS_PER_BATCH") {
            self.batch.max_tokens_per_batch = parse_var("GATEWAY_MAX_TOKENS_PER_BATCH", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_PRE_BATCH_SLEEP_MS") {
            self.batch.pre_batch_sleep_ms = parse_var("GATEWAY_PRE_BATCH_SLEEP_MS", &v)?;
        }
        if let Some(v) = lookup("GATEWAY_INTER_BATCH_SLEEP_MS") {
            self.batch.inter_batch_sleep_ms = parse_var("GATEWAY_INTER_BATCH_SLEEP_MS", &v)?;
        }

        if let Some(v) = lookup("GATEWAY_MAX_RETRIES") {
            self.retry.max_retries = parse_var("GATEWAY_MAX_RETRIES", &v)?;
        }

        if let Some(v) = lookup("GATEWAY_LOG_LEVEL") {
            self.logging.level = parse_var("GATEWAY_LOG_LEVEL", &v)?;
        }

        Ok(())
    }
}
