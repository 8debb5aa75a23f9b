//! Rate-governed execution of one upstream call

use super::types::RequestMeta;
use crate::core::backoff::AdaptiveBackoffController;
use crate::core::rate_limiter::SlidingWindowLimiter;
use crate::monitoring::UsageMonitor;
use crate::utils::error::{
    CircuitBreaker, ErrorUtils, GatewayError, Result, RetryPolicy, UpstreamError,
};
use crate::utils::time::{Clock, sleep_or_cancel};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs upstream calls through the limiter, breaker and backoff controller
///
/// Per call: an optional pause-all, then for every attempt a breaker check,
/// window admission, the adaptive spacing delay and finally the call itself.
/// Rate-limit failures are retried with exponential backoff until
/// `max_retries` attempts have been made. Any other failure is retried once.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    clock: Arc<dyn Clock>,
    limiter: Arc<SlidingWindowLimiter>,
    breaker: Arc<CircuitBreaker>,
    backoff: Arc<AdaptiveBackoffController>,
    usage: Arc<UsageMonitor>,
    retry: RetryPolicy,
    min_delay: Duration,
}

impl RequestExecutor {
    pub fn new(
        clock: Arc<dyn Clock>,
        limiter: Arc<SlidingWindowLimiter>,
        breaker: Arc<CircuitBreaker>,
        backoff: Arc<AdaptiveBackoffController>,
        usage: Arc<UsageMonitor>,
        retry: RetryPolicy,
    ) -> Self {
        let min_delay = backoff.min_delay();
        Self {
            clock,
            limiter,
            breaker,
            backoff,
            usage,
            retry,
            min_delay,
        }
    }

    /// Execute `call` under rate governance
    ///
    /// `call` is invoked once per attempt and must build a fresh future each
    /// time.
    pub async fn execute<F, Fut>(
        &self,
        meta: &RequestMeta,
        mut call: F,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<String, UpstreamError>>,
    {
        if let Some(pause) = self.backoff.should_pause_all() {
            warn!("Pausing for {:?} before contacting upstream", pause);
            self.sleep(pause, cancel).await?;
        }

        let mut calls: u32 = 0;
        let mut rate_limited_attempts: u32 = 0;
        let mut retried_other = false;

        loop {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            self.breaker.check()?;
            self.wait_for_admission(cancel).await?;

            let spacing = self.min_delay.max(self.backoff.recommended_delay());
            if !spacing.is_zero() {
                debug!("Spacing upstream call by {:?}", spacing);
                self.sleep(spacing, cancel).await?;
            }

            calls += 1;
            let outcome = call().await.and_then(|text| {
                if text.trim().is_empty() {
                    Err(UpstreamError::empty_response())
                } else {
                    Ok(text)
                }
            });

            match outcome {
                Ok(text) => {
                    self.breaker.record_success();
                    self.backoff.record_success();
                    self.usage.log_request(meta.success_log(&text));
                    if calls > 1 {
                        info!("Upstream call succeeded after {} attempts", calls);
                    }
                    return Ok(text);
                }
                Err(err) if err.is_rate_limited() => {
                    self.breaker.record_failure();
                    let retry_after = err
                        .retry_after
                        .or_else(|| ErrorUtils::extract_retry_after(&err.message));
                    self.backoff.record_failure(&err.message, retry_after);
                    self.usage.log_request(meta.failure_log(true));

                    rate_limited_attempts += 1;
                    if rate_limited_attempts >= self.retry.max_retries() {
                        error!(
                            "Upstream still rate limiting after {} attempts: {}",
                            calls, err.message
                        );
                        return Err(GatewayError::persistent_rate_limit(calls, err.message));
                    }

                    let delay = self.retry.backoff_delay(rate_limited_attempts - 1);
                    warn!(
                        "Rate limited (attempt {}/{}), retrying in {:.1}s",
                        rate_limited_attempts,
                        self.retry.max_retries(),
                        delay.as_secs_f64()
                    );
                    self.sleep(delay, cancel).await?;
                }
                Err(err) => {
                    self.breaker.record_failure();
                    self.usage.log_request(meta.failure_log(false));

                    if retried_other {
                        error!("Upstream call failed: {}", err);
                        return Err(GatewayError::Upstream(err));
                    }
                    retried_other = true;

                    let delay = self.retry.upstream_retry_delay();
                    warn!("Upstream call failed ({}), retrying once in {:?}", err, delay);
                    self.sleep(delay, cancel).await?;
                }
            }
        }
    }

    async fn wait_for_admission(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            let admission = self.limiter.admit()?;
            if admission.is_admitted() {
                return Ok(());
            }

            let wait = admission.wait();
            info!("Minute window full, waiting {:.1}s", wait.as_secs_f64());
            self.sleep(wait, cancel).await?;
        }
    }

    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        sleep_or_cancel(self.clock.as_ref(), duration, cancel).await
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
