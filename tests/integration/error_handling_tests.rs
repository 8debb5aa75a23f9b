//! Error handling integration tests
//!
//! Capacity errors must stay distinguishable from ordinary upstream
//! failures, and ordinary failures must keep their original message.

#[cfg(test)]
mod tests {
    use crate::common::{ScriptedUpstream, fast_config, manual_gateway};
    use std::time::Duration;
    use upstream_gateway::{GatewayError, UpstreamError, UpstreamErrorKind};

    // ==================== Upstream Classification ====================

    /// Typed status codes win over message text
    #[test]
    fn test_status_classification() {
        assert_eq!(
            UpstreamError::from_status(429, "slow down").kind,
            UpstreamErrorKind::RateLimited
        );
        assert_eq!(
            UpstreamError::from_status(504, "gateway timeout").kind,
            UpstreamErrorKind::Timeout
        );
        assert_eq!(
            UpstreamError::from_status(400, "quota field missing").kind,
            UpstreamErrorKind::Client
        );
        assert!(!UpstreamError::from_status(400, "quota field missing").is_rate_limited());
    }

    /// Opaque messages fall back to keyword matching
    #[test]
    fn test_message_classification() {
        for message in [
            "HTTP 429",
            "Rate limit reached",
            "Quota exceeded for metric",
            "Too Many Requests",
            "RESOURCE EXHAUSTED",
        ] {
            assert!(
                UpstreamError::from_message(message).is_rate_limited(),
                "{} should be rate limited",
                message
            );
        }
        assert!(!UpstreamError::from_message("connection reset by peer").is_rate_limited());
    }

    #[test]
    fn test_retry_hint_recovered_from_text() {
        let err = UpstreamError::from_message("429: retry_delay { seconds: 42 }");
        assert_eq!(err.retry_after, Some(Duration::from_secs(42)));
    }

    // ==================== Propagation ====================

    #[tokio::test]
    async fn test_non_capacity_error_keeps_message() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::failing(UpstreamError::client("400 invalid prompt format"));

        let err = gateway.call_prompt(&upstream, "x").await.unwrap_err();

        assert!(!err.is_capacity_error());
        assert!(err.retry_after().is_none());
        match err {
            GatewayError::Upstream(inner) => {
                assert_eq!(inner.kind, UpstreamErrorKind::Client);
                assert_eq!(inner.message, "400 invalid prompt format");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_circuit_open_carries_retry_after() {
        let (gateway, _clock) = manual_gateway(fast_config());
        let upstream = ScriptedUpstream::failing(UpstreamError::timeout("deadline exceeded"));
        let _ = gateway.call_prompt(&upstream, "x").await;

        let err = gateway.call_prompt(&upstream, "x").await.unwrap_err();

        assert!(err.is_capacity_error());
        let retry_after = err.retry_after().expect("circuit open has a retry hint");
        assert!(retry_after <= Duration::from_secs(60));
        assert!(err.to_string().starts_with("Upstream temporarily unavailable"));
    }

    #[test]
    fn test_capacity_errors_have_distinct_codes() {
        let codes = [
            GatewayError::DailyQuotaExceeded.code(),
            GatewayError::circuit_open(Duration::from_secs(5)).code(),
            GatewayError::persistent_rate_limit(3, "429").code(),
            GatewayError::Upstream(UpstreamError::server("boom")).code(),
        ];

        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
