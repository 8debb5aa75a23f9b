//! Batch submission integration tests
//!
//! Combined prompts through the public API, including partial parse
//! failures, whole-batch failures and cancellation.

#[cfg(test)]
mod tests {
    use crate::common::assertions::BatchResultAssertions;
    use crate::common::upstream::labelled_items;
    use crate::common::{ScriptedUpstream, fast_config, manual_gateway, sample_items};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use upstream_gateway::{
        AnalysisKind, FallbackReason, ItemResult, ItemSource, RiskLevel, UpstreamError,
    };

    // ==================== Completeness ====================

    #[tokio::test]
    async fn test_every_item_gets_a_result() {
        let (gateway, clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();
        let items = sample_items(12);

        let results = gateway
            .submit_batch(&items, AnalysisKind::Risk, &upstream)
            .await;

        results.assert_complete(12);
        results.assert_all_from(ItemSource::Upstream);
        assert!(results.values().all(|r| r.risk_level == RiskLevel::Low));
        assert_eq!(upstream.calls(), 3);
        assert_eq!(
            upstream
                .prompts()
                .iter()
                .map(|p| labelled_items(p))
                .collect::<Vec<_>>(),
            vec![5, 5, 2]
        );
        // pre, inter, pre, inter, pre
        assert_eq!(clock.total_slept(), Duration::from_secs(10 * 3 + 15 * 2));
    }

    #[tokio::test]
    async fn test_summary_kind_uses_its_own_prompt() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();

        gateway
            .submit_batch(&sample_items(2), AnalysisKind::Summary, &upstream)
            .await
            .assert_complete(2);

        assert!(upstream.prompts()[0].contains("simple language"));
    }

    #[tokio::test]
    async fn test_batching_is_recorded_in_usage() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();

        gateway
            .submit_batch(&sample_items(5), AnalysisKind::Risk, &upstream)
            .await;

        let usage = gateway.status().usage;
        assert_eq!(usage.total_requests, 1);
        assert_eq!(usage.total_tokens_saved, 4_000);
        assert!(usage.avg_batch_efficiency > 0.0);
    }

    // ==================== Fallbacks ====================

    #[tokio::test]
    async fn test_garbled_block_falls_back_alone() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let response = r#"ITEM_1_ANALYSIS:
{"risk_level": "High", "analysis": "Broad indemnity"}

ITEM_2_ANALYSIS:
I could not analyse this one.

ITEM_3_ANALYSIS:
{"risk_level": "Medium", "analysis": "Notice period"}"#;
        let upstream = ScriptedUpstream::echo().then(Ok(response.to_string()));

        let outcome = gateway
            .submit_batch_detailed(&sample_items(3), AnalysisKind::Risk, &upstream)
            .await;

        outcome.results.assert_complete(3);
        assert_eq!(
            outcome.results[&0],
            ItemResult::upstream(RiskLevel::High, "Broad indemnity")
        );
        assert_eq!(
            outcome.results[&1],
            ItemResult::fallback(FallbackReason::ParseFailure)
        );
        assert_eq!(outcome.results[&2].risk_level, RiskLevel::Medium);
        assert_eq!(outcome.report.parsed, 1);
        assert_eq!(outcome.report.fallback_items, 1);
        assert_eq!(gateway.status().usage.parse_failures, 1);
    }

    #[tokio::test]
    async fn test_failing_upstream_falls_back_after_requeue() {
        let mut config = fast_config();
        config.circuit_breaker.failure_threshold = 10;
        let (gateway, clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::failing(UpstreamError::server("500 Internal Server Error"));

        let outcome = gateway
            .submit_batch_detailed(&sample_items(4), AnalysisKind::Risk, &upstream)
            .await;

        outcome.results.assert_complete(4);
        outcome.results.assert_all_from(ItemSource::Fallback);
        assert_eq!(outcome.report.jobs_submitted, 1);
        assert_eq!(outcome.report.requeued, 1);
        assert_eq!(outcome.report.failed_final, 1);
        assert!(clock.sleeps().contains(&Duration::from_secs(30)));

        let status = gateway.status();
        assert_eq!(status.usage.batch_failures, 1);
        assert_eq!(gateway.usage().recent_errors().len(), 1);
    }

    #[tokio::test]
    async fn test_open_breaker_fails_batch_without_calls() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let failing = ScriptedUpstream::failing(UpstreamError::server("503"));
        assert!(gateway.call_prompt(&failing, "probe").await.is_err());

        let upstream = ScriptedUpstream::echo();
        let outcome = gateway
            .submit_batch_detailed(&sample_items(3), AnalysisKind::Risk, &upstream)
            .await;

        // 10s pre-batch sleep keeps the 60s breaker open for both submissions
        assert_eq!(upstream.calls(), 0);
        outcome.results.assert_complete(3);
        outcome.results.assert_all_from(ItemSource::Fallback);
        assert_eq!(outcome.report.failed_final, 1);
    }

    #[tokio::test]
    async fn test_rate_limited_batch_recovers_inside_executor() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo().then(Err(UpstreamError::from_message(
            "429 Too Many Requests, retry after 5 seconds",
        )));

        let outcome = gateway
            .submit_batch_detailed(&sample_items(2), AnalysisKind::Risk, &upstream)
            .await;

        outcome.results.assert_all_from(ItemSource::Upstream);
        assert_eq!(outcome.report.requeued, 0);
        assert_eq!(upstream.calls(), 2);
        assert_eq!(gateway.status().usage.rate_limit_hits, 1);
    }

    // ==================== Cancellation ====================

    #[tokio::test]
    async fn test_cancelled_batch_still_complete() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();
        let token = CancellationToken::new();
        token.cancel();

        let results = gateway
            .submit_batch_with_cancel(&sample_items(8), AnalysisKind::Risk, &upstream, &token)
            .await;

        results.assert_complete(8);
        assert!(
            results
                .values()
                .all(|r| *r == ItemResult::fallback(FallbackReason::Cancelled))
        );
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (gateway, clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();

        let results = gateway
            .submit_batch(&[], AnalysisKind::Risk, &upstream)
            .await;

        assert!(results.is_empty());
        assert_eq!(upstream.calls(), 0);
        assert!(clock.sleeps().is_empty());
    }
}
