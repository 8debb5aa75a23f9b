//! # upstream-gateway
//!
//! An adaptive, rate-governed request gateway for a single, severely
//! rate-limited AI upstream.
//!
//! ## Features
//!
//! - **Sliding-window admission**: per-minute waits and a hard daily stop
//! - **Circuit breaking**: fail fast while the upstream is known to be down
//! - **Adaptive backoff**: spacing that grows under rate limits and shrinks
//!   after sustained success, with a global pause when limits cluster
//! - **Batching**: many items bundled into one labelled prompt, with per-item
//!   fallbacks so a malformed response never fails the whole batch
//! - **Usage monitoring**: read-only diagnostics and recommendations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use upstream_gateway::{Config, Gateway, UpstreamError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     upstream_gateway::init_logging(&config.gateway.logging);
//!
//!     let gateway = Gateway::new(config.into_gateway())?;
//!     let answer = gateway
//!         .execute(|| async { Ok::<_, UpstreamError>("pong".to_string()) })
//!         .await?;
//!
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod utils;

// Re-export main types
pub use config::{Config, GatewayConfig, Validate};
pub use core::batch::{
    AnalysisKind, BatchOutcome, BatchReport, FallbackReason, ItemResult, ItemSource, RiskLevel,
};
pub use core::upstream::UpstreamClient;
pub use utils::error::{GatewayError, Result, UpstreamError, UpstreamErrorKind};
pub use utils::logging::init_logging;
pub use utils::time::{Clock, ManualClock, SystemClock};

use crate::core::backoff::{AdaptiveBackoffController, RateLimitAnalysis};
use crate::core::batch::BatchScheduler;
use crate::core::executor::{RequestExecutor, RequestMeta};
use crate::core::rate_limiter::{RateLimitStatus, SlidingWindowLimiter};
use crate::monitoring::{UsageMonitor, UsageSnapshot};
use crate::utils::error::{CircuitBreaker, CircuitBreakerMetrics, RetryPolicy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Point-in-time view of every component
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub rate_limit: RateLimitStatus,
    pub circuit_breaker: CircuitBreakerMetrics,
    pub backoff: RateLimitAnalysis,
    pub usage: UsageSnapshot,
    pub shut_down: bool,
}

/// The composition root
///
/// Owns one shared limiter, breaker, backoff controller and usage monitor.
/// Clone it (cheaply) to hand it to concurrent callers; clones share state.
#[derive(Debug, Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    limiter: Arc<SlidingWindowLimiter>,
    breaker: Arc<CircuitBreaker>,
    backoff: Arc<AdaptiveBackoffController>,
    usage: Arc<UsageMonitor>,
    executor: RequestExecutor,
    scheduler: BatchScheduler,
    shutdown: CancellationToken,
}

impl Gateway {
    /// Create a gateway on the system clock
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a gateway reading time from `clock`
    pub fn with_clock(config: GatewayConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        info!("Creating gateway");
        config
            .validate()
            .map_err(|e| GatewayError::config(format!("Gateway config error: {}", e)))?;

        debug!("Initializing admission and resilience components");
        let limiter = Arc::new(SlidingWindowLimiter::new(
            config.rate_limit.clone(),
            clock.clone(),
        ));
        let breaker = Arc::new(CircuitBreaker::new(
            config.circuit_breaker.clone(),
            clock.clone(),
        ));
        let backoff = Arc::new(AdaptiveBackoffController::new(
            config.backoff.clone(),
            clock.clone(),
        ));
        let usage = Arc::new(UsageMonitor::new(clock.clone()));

        let executor = RequestExecutor::new(
            clock,
            limiter.clone(),
            breaker.clone(),
            backoff.clone(),
            usage.clone(),
            RetryPolicy::new(config.retry.clone()),
        );
        let scheduler = BatchScheduler::new(executor.clone(), usage.clone(), config.batch.clone());

        info!(
            "Gateway ready: {}/min, {}/day, breaker after {} failures",
            config.rate_limit.max_requests_per_minute,
            config.rate_limit.max_requests_per_day,
            config.circuit_breaker.failure_threshold
        );

        Ok(Self {
            config: Arc::new(config),
            limiter,
            breaker,
            backoff,
            usage,
            executor,
            scheduler,
            shutdown: CancellationToken::new(),
        })
    }

    /// Run one upstream call under rate governance
    pub async fn execute<F, Fut>(&self, call: F) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<String, UpstreamError>>,
    {
        self.executor
            .execute(&RequestMeta::default(), call, &self.shutdown)
            .await
    }

    /// Like [`execute`](Self::execute), abandoning any wait once `cancel` fires
    pub async fn execute_with_cancel<F, Fut>(
        &self,
        call: F,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<String, UpstreamError>>,
    {
        let meta = RequestMeta::default();
        self.linked(cancel, |token| async move {
            self.executor.execute(&meta, call, &token).await
        })
        .await
    }

    /// Send a single prompt through `client`
    pub async fn call_prompt(&self, client: &dyn UpstreamClient, prompt: &str) -> Result<String> {
        self.executor
            .execute(
                &RequestMeta::individual(prompt),
                || client.call(prompt),
                &self.shutdown,
            )
            .await
    }

    /// Analyse `items` in combined requests, one result per item keyed `0..n`
    pub async fn submit_batch(
        &self,
        items: &[String],
        kind: AnalysisKind,
        client: &dyn UpstreamClient,
    ) -> BTreeMap<usize, ItemResult> {
        self.submit_batch_detailed(items, kind, client).await.results
    }

    /// Like [`submit_batch`](Self::submit_batch); once `cancel` fires no
    /// further batch is submitted and the remaining items fall back
    pub async fn submit_batch_with_cancel(
        &self,
        items: &[String],
        kind: AnalysisKind,
        client: &dyn UpstreamClient,
        cancel: &CancellationToken,
    ) -> BTreeMap<usize, ItemResult> {
        self.linked(cancel, |token| async move {
            self.scheduler.submit(items, kind, client, &token).await
        })
        .await
        .results
    }

    /// Results together with the run's job counters
    pub async fn submit_batch_detailed(
        &self,
        items: &[String],
        kind: AnalysisKind,
        client: &dyn UpstreamClient,
    ) -> BatchOutcome {
        self.scheduler
            .submit(items, kind, client, &self.shutdown)
            .await
    }

    /// Run `op` with a token that fires on shutdown or when `caller` fires
    ///
    /// `op` is still awaited after cancellation so it can finish its own
    /// cleanup.
    async fn linked<T, Op, Fut>(&self, caller: &CancellationToken, op: Op) -> T
    where
        Op: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let token = self.shutdown.child_token();
        let fut = op(token.clone());
        tokio::pin!(fut);

        tokio::select! {
            biased;
            out = &mut fut => out,
            _ = caller.cancelled() => {
                debug!("Caller cancelled, stopping outstanding waits");
                token.cancel();
                fut.await
            }
        }
    }

    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            rate_limit: self.limiter.status(),
            circuit_breaker: self.breaker.metrics(),
            backoff: self.backoff.analysis(),
            usage: self.usage.current_usage(),
            shut_down: self.shutdown.is_cancelled(),
        }
    }

    /// Markdown analysis of recent rate limiting
    pub fn rate_limit_report(&self) -> String {
        self.backoff.report()
    }

    /// Markdown usage report with recommendations
    pub fn usage_report(&self) -> String {
        self.usage.report()
    }

    /// Clear every window, counter and delay
    pub fn reset(&self) {
        info!("Resetting gateway state");
        self.limiter.reset();
        self.breaker.reset();
        self.backoff.reset();
        self.usage.reset();
    }

    /// Abort every pending wait; later calls fail with `Cancelled`
    pub fn shutdown(&self) {
        info!("Shutting down gateway");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn usage(&self) -> &UsageMonitor {
        &self.usage
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
