//! Gateway integration tests
//!
//! Single calls through the public API: window admission, circuit
//! breaking, adaptive backoff, cancellation and diagnostics.

#[cfg(test)]
mod tests {
    use crate::common::assertions::assert_slept_at_least;
    use crate::common::{ScriptedUpstream, fast_config, manual_gateway};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use upstream_gateway::core::backoff::RecommendedAction;
    use upstream_gateway::{Gateway, GatewayError, UpstreamError};

    fn ping(
        upstream: &ScriptedUpstream,
    ) -> impl FnMut() -> std::future::Ready<Result<String, UpstreamError>> + '_ {
        move || std::future::ready(upstream.respond("ping"))
    }

    // ==================== Admission Scenarios ====================

    /// Three back-to-back calls against a two-per-minute window
    #[tokio::test]
    async fn test_third_call_waits_for_minute_window() {
        let mut config = fast_config();
        config.rate_limit.max_requests_per_minute = 2;
        let (gateway, clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::echo();

        for _ in 0..3 {
            let result = gateway.execute(ping(&upstream)).await;
            assert_eq!(result.unwrap(), "ok");
        }

        assert_eq!(upstream.calls(), 3);
        assert_eq!(clock.sleeps().len(), 1);
        assert_slept_at_least(&clock.sleeps(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_daily_quota_is_a_hard_stop() {
        let mut config = fast_config();
        config.rate_limit.max_requests_per_day = 2;
        let (gateway, clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::echo();

        gateway.execute(ping(&upstream)).await.unwrap();
        gateway.execute(ping(&upstream)).await.unwrap();
        clock.advance(Duration::from_secs(3_600));

        let err = gateway.execute(ping(&upstream)).await.unwrap_err();

        assert!(matches!(err, GatewayError::DailyQuotaExceeded));
        assert!(err.is_capacity_error());
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_window() {
        let mut config = fast_config();
        config.rate_limit.max_requests_per_minute = 3;
        let (gateway, clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::echo();

        let calls = (0..5).map(|_| {
            let gateway = gateway.clone();
            let upstream = &upstream;
            async move { gateway.execute(ping(upstream)).await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(upstream.calls(), 5);
        assert_eq!(gateway.status().usage.total_requests, 5);
        assert_slept_at_least(&clock.sleeps(), Duration::from_secs(1));
    }

    // ==================== Circuit Breaker Scenarios ====================

    /// Two failures open the breaker; the next call never reaches upstream
    #[tokio::test]
    async fn test_breaker_fails_fast_after_two_failures() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::failing(UpstreamError::server("503 Service Unavailable"));

        let first = gateway.execute(ping(&upstream)).await.unwrap_err();
        assert!(matches!(first, GatewayError::Upstream(_)));
        assert_eq!(upstream.calls(), 2);

        let second = gateway.execute(ping(&upstream)).await.unwrap_err();
        match second {
            GatewayError::CircuitOpen { retry_after } => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected CircuitOpen, got {:?}", other),
        }
        assert_eq!(upstream.calls(), 2);
        assert_eq!(gateway.status().circuit_breaker.times_opened, 1);
    }

    #[tokio::test]
    async fn test_rate_limits_open_the_breaker() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::failing(UpstreamError::from_message(
            "429 Resource has been exhausted (e.g. check quota)",
        ));

        let err = gateway.execute(ping(&upstream)).await.unwrap_err();

        assert!(matches!(err, GatewayError::CircuitOpen { .. }));
        assert_eq!(upstream.calls(), 2);
        assert_eq!(gateway.status().usage.rate_limit_hits, 2);
    }

    #[tokio::test]
    async fn test_breaker_allows_probe_after_timeout() {
        let (gateway, clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo()
            .then(Err(UpstreamError::server("boom")))
            .then(Err(UpstreamError::server("boom")));

        assert!(gateway.execute(ping(&upstream)).await.is_err());
        clock.advance(Duration::from_secs(61));

        let result = gateway.execute(ping(&upstream)).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(gateway.status().circuit_breaker.consecutive_failures, 0);
    }

    // ==================== Backoff Scenarios ====================

    #[tokio::test]
    async fn test_rate_limit_then_recovery() {
        let mut config = fast_config();
        config.circuit_breaker.failure_threshold = 5;
        let (gateway, clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::echo()
            .then(Err(UpstreamError::rate_limited("quota exceeded for requests per minute")));

        let result = gateway.execute(ping(&upstream)).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(upstream.calls(), 2);
        // First backoff step: base 2s plus jitter
        assert_slept_at_least(&clock.sleeps(), Duration::from_secs(2));

        let status = gateway.status();
        assert_eq!(status.usage.rate_limit_hits, 1);
        assert_eq!(status.usage.total_requests, 2);
        assert_eq!(status.backoff.consecutive_failures, 0);
        assert_eq!(status.backoff.events_last_minute, 1);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_surfaces_attempts() {
        let mut config = fast_config();
        config.circuit_breaker.failure_threshold = 100;
        config.retry.max_retries = 3;
        let (gateway, _clock) = manual_gateway(config);
        let upstream = ScriptedUpstream::failing(UpstreamError::from_status(429, "Too Many Requests"));

        let err = gateway.execute(ping(&upstream)).await.unwrap_err();

        match &err {
            GatewayError::PersistentRateLimit { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("expected PersistentRateLimit, got {:?}", other),
        }
        assert!(err.is_capacity_error());
        assert_eq!(upstream.calls(), 3);
        assert_eq!(
            gateway.status().backoff.recommended_action,
            RecommendedAction::Medium
        );
    }

    // ==================== Prompt Calls ====================

    #[tokio::test]
    async fn test_call_prompt_goes_through_client() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo();

        let answer = gateway
            .call_prompt(&upstream, "Explain the termination clause")
            .await
            .unwrap();

        assert_eq!(answer, "ok");
        assert_eq!(upstream.prompts(), vec!["Explain the termination clause"]);
        let usage = gateway.status().usage;
        assert_eq!(usage.total_requests, 1);
        assert!(usage.tokens_last_hour > 0);
    }

    #[tokio::test]
    async fn test_empty_response_is_an_upstream_error() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo()
            .then(Ok("   ".to_string()))
            .then(Ok(String::new()));

        let err = gateway.call_prompt(&upstream, "hello").await.unwrap_err();

        assert!(matches!(err, GatewayError::Upstream(_)));
        assert!(!err.is_capacity_error());
    }

    // ==================== Cancellation ====================

    #[tokio::test]
    async fn test_caller_cancellation_aborts_spacing_wait() {
        let mut config = fast_config();
        config.backoff.min_delay_ms = 60_000;
        config.backoff.initial_delay_ms = 60_000;
        let gateway = Gateway::new(config).unwrap();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            gateway.execute_with_cancel(
                || async { Ok::<_, UpstreamError>("late".to_string()) },
                &token,
            ),
        )
        .await
        .expect("cancellation should end the wait");

        assert!(matches!(result, Err(GatewayError::Cancelled)));
        assert!(!gateway.is_shut_down());
    }

    #[tokio::test]
    async fn test_shutdown_aborts_pending_wait() {
        let mut config = fast_config();
        config.backoff.min_delay_ms = 60_000;
        config.backoff.initial_delay_ms = 60_000;
        let gateway = Gateway::new(config).unwrap();

        let handle = gateway.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.shutdown();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            gateway.execute(|| async { Ok::<_, UpstreamError>("late".to_string()) }),
        )
        .await
        .expect("shutdown should end the wait");

        assert!(matches!(result, Err(GatewayError::Cancelled)));
        assert!(gateway.status().shut_down);
    }

    // ==================== Diagnostics ====================

    #[tokio::test]
    async fn test_reports_and_reset() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::echo().then(Err(UpstreamError::rate_limited("429")));

        gateway.execute(ping(&upstream)).await.unwrap();

        assert!(gateway.rate_limit_report().starts_with("# Rate Limit Recovery Analysis"));
        assert!(gateway.usage_report().starts_with("# Upstream Usage Report"));
        assert!(serde_json::to_string(&gateway.status()).is_ok());

        gateway.reset();

        let status = gateway.status();
        assert_eq!(status.rate_limit.minute_count, 0);
        assert_eq!(status.usage.total_requests, 0);
        assert_eq!(status.backoff.events_last_hour, 0);
        assert_eq!(status.circuit_breaker.total_failures, 0);
    }
}
