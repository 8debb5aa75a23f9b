//! Sequential submission of combined requests

use super::parser::parse_response;
use super::partition::{chars_saved, compress_item, partition};
use super::prompt::build_prompt;
use super::types::{
    AnalysisKind, BatchJob, BatchJobState, BatchOutcome, BatchReport, FallbackReason, ItemResult,
};
use crate::config::BatchConfig;
use crate::core::executor::{RequestExecutor, RequestMeta};
use crate::core::upstream::UpstreamClient;
use crate::monitoring::UsageMonitor;
use crate::utils::error::{GatewayError, Result};
use crate::utils::time::sleep_or_cancel;
use crate::utils::tokens::{CHARS_PER_TOKEN, estimate_tokens};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Estimated tokens saved per item by sharing one request instead of many
pub const TOKENS_SAVED_PER_BATCHED_ITEM: u64 = 1_000;

/// Bundles many items into few upstream calls
///
/// Batches are processed strictly one after another. Every submission is
/// preceded by the pre-batch sleep, successive batches are separated by the
/// inter-batch sleep, and a batch that fails is re-submitted once after the
/// requeue delay before its items fall back.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    executor: RequestExecutor,
    usage: Arc<UsageMonitor>,
    config: BatchConfig,
}

enum JobOutcome {
    Parsed,
    FailedFinal(GatewayError),
}

impl BatchScheduler {
    pub fn new(executor: RequestExecutor, usage: Arc<UsageMonitor>, config: BatchConfig) -> Self {
        Self {
            executor,
            usage,
            config,
        }
    }

    /// Compress, partition and label `items` into queued jobs
    pub fn plan<S: AsRef<str>>(&self, items: &[S], kind: AnalysisKind) -> Vec<BatchJob> {
        let created_at = self.executor.clock().utc_now();
        let prepared: Vec<std::borrow::Cow<'_, str>> = items
            .iter()
            .map(|item| {
                let item = item.as_ref();
                if self.config.compress_items {
                    compress_item(item, self.config.max_item_chars)
                } else {
                    std::borrow::Cow::Borrowed(item)
                }
            })
            .collect();

        partition(
            &prepared,
            self.config.max_batch_size,
            self.config.max_tokens_per_batch,
        )
        .into_iter()
        .map(|indices| {
            let texts: Vec<&str> = indices.iter().map(|&i| prepared[i].as_ref()).collect();
            let saved_chars: usize = indices
                .iter()
                .map(|&i| chars_saved(items[i].as_ref(), &prepared[i]))
                .sum();
            let tokens_saved = (indices.len() as u64 - 1) * TOKENS_SAVED_PER_BATCHED_ITEM
                + (saved_chars / CHARS_PER_TOKEN) as u64;

            let prompt = build_prompt(kind, &texts);
            let prompt_tokens = estimate_tokens(&prompt) as u64;
            BatchJob::new(indices, kind, prompt, prompt_tokens, tokens_saved, created_at)
        })
        .collect()
    }

    /// Analyse `items`, returning exactly one result per item keyed `0..n`
    pub async fn submit(
        &self,
        items: &[String],
        kind: AnalysisKind,
        client: &dyn UpstreamClient,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let mut jobs = self.plan(items, kind);
        let mut results = BTreeMap::new();
        let mut report = BatchReport::default();

        info!(
            "Submitting {} items as {} {} batch(es)",
            items.len(),
            jobs.len(),
            kind.as_str()
        );

        let mut halted: Option<FallbackReason> = None;

        for (n, job) in jobs.iter_mut().enumerate() {
            if let Some(reason) = halted {
                self.finish_unsubmitted(job, reason, &mut results, &mut report);
                continue;
            }

            if n > 0 && self.pause(self.config.inter_batch_sleep(), cancel).await.is_err() {
                halted = Some(FallbackReason::Cancelled);
                self.finish_unsubmitted(job, FallbackReason::Cancelled, &mut results, &mut report);
                continue;
            }

            match self
                .run_job(job, client, cancel, &mut results, &mut report)
                .await
            {
                Ok(JobOutcome::Parsed) => report.parsed += 1,
                Ok(JobOutcome::FailedFinal(err)) => {
                    report.failed_final += 1;
                    self.fail_job(job, &err, &mut results, &mut report);
                    if matches!(err, GatewayError::DailyQuotaExceeded) {
                        warn!("Daily quota exhausted, remaining batches fall back");
                        halted = Some(FallbackReason::BatchFailure);
                    }
                }
                Err(_) => {
                    info!("Batch job {} cancelled", job.id);
                    halted = Some(FallbackReason::Cancelled);
                    self.finish_unsubmitted(job, FallbackReason::Cancelled, &mut results, &mut report);
                }
            }
        }

        debug!("Batch run finished: {:?}", report);
        BatchOutcome { results, report }
    }

    /// Submit one job, re-submitting once on failure
    ///
    /// `Err` only on cancellation.
    async fn run_job(
        &self,
        job: &mut BatchJob,
        client: &dyn UpstreamClient,
        cancel: &CancellationToken,
        results: &mut BTreeMap<usize, ItemResult>,
        report: &mut BatchReport,
    ) -> Result<JobOutcome> {
        let meta = RequestMeta::batch(job.len(), job.prompt_tokens, job.tokens_saved);

        loop {
            self.pause(self.config.pre_batch_sleep(), cancel).await?;

            if job.submissions == 0 {
                report.jobs_submitted += 1;
            } else {
                report.requeued += 1;
            }
            job.transition(BatchJobState::Submitted);

            let prompt = job.prompt.as_str();
            match self
                .executor
                .execute(&meta, || client.call(prompt), cancel)
                .await
            {
                Ok(text) => {
                    self.collect(job, &text, results, report);
                    job.transition(BatchJobState::Parsed);
                    return Ok(JobOutcome::Parsed);
                }
                Err(GatewayError::Cancelled) => return Err(GatewayError::Cancelled),
                Err(err @ GatewayError::DailyQuotaExceeded) => {
                    return Ok(JobOutcome::FailedFinal(err));
                }
                Err(err) if job.submissions < 2 => {
                    warn!(
                        "Batch job {} failed ({}), re-queueing in {:?}",
                        job.id,
                        err,
                        self.config.requeue_delay()
                    );
                    job.transition(BatchJobState::FailedRetry);
                    self.pause(self.config.requeue_delay(), cancel).await?;
                }
                Err(err) => return Ok(JobOutcome::FailedFinal(err)),
            }
        }
    }

    fn collect(
        &self,
        job: &BatchJob,
        text: &str,
        results: &mut BTreeMap<usize, ItemResult>,
        report: &mut BatchReport,
    ) {
        let job_id = job.id.to_string();
        for (parsed, &index) in parse_response(text, job.len()).into_iter().zip(&job.indices) {
            let result = match parsed {
                Ok(result) => result,
                Err(err) => {
                    warn!("Batch job {}: {}", job_id, err);
                    self.usage.record_parse_failure(&job_id, err.position());
                    report.fallback_items += 1;
                    ItemResult::fallback(FallbackReason::ParseFailure)
                }
            };
            results.insert(index, result);
        }
    }

    fn fail_job(
        &self,
        job: &mut BatchJob,
        err: &GatewayError,
        results: &mut BTreeMap<usize, ItemResult>,
        report: &mut BatchReport,
    ) {
        error!(
            "Batch job {} failed for good, {} items fall back: {}",
            job.id,
            job.len(),
            err
        );
        job.transition(BatchJobState::FailedFinal);
        self.usage
            .record_batch_failure(&job.id.to_string(), &err.to_string());
        fill_fallbacks(job, FallbackReason::BatchFailure, results, report);
    }

    fn finish_unsubmitted(
        &self,
        job: &mut BatchJob,
        reason: FallbackReason,
        results: &mut BTreeMap<usize, ItemResult>,
        report: &mut BatchReport,
    ) {
        if !job.state.is_terminal() {
            job.transition(BatchJobState::FailedFinal);
        }
        fill_fallbacks(job, reason, results, report);
    }

    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        sleep_or_cancel(self.executor.clock().as_ref(), duration, cancel).await
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

fn fill_fallbacks(
    job: &BatchJob,
    reason: FallbackReason,
    results: &mut BTreeMap<usize, ItemResult>,
    report: &mut BatchReport,
) {
    for &index in &job.indices {
        if results.insert(index, ItemResult::fallback(reason)).is_none() {
            report.fallback_items += 1;
        }
    }
}
