//! Configuration integration tests
//!
//! Loading YAML files from disk, overlaying overrides and building a
//! gateway from the result.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Arc;
    use upstream_gateway::utils::logging::LogLevel;
    use upstream_gateway::{Config, Gateway, GatewayConfig, GatewayError, ManualClock, Validate};

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    // ==================== File Loading ====================

    #[tokio::test]
    async fn test_load_yaml_file() {
        let file = write_config(
            r#"
rate_limit:
  max_requests_per_minute: 2
  max_requests_per_day: 100
circuit_breaker:
  failure_threshold: 3
  timeout_ms: 30000
backoff:
  min_delay_ms: 1000
  initial_delay_ms: 1000
batch:
  max_batch_size: 4
  pre_batch_sleep_ms: 500
logging:
  level: debug
  json: true
"#,
        );

        let config = Config::from_file(file.path()).await.unwrap();
        let gateway = config.gateway;

        assert_eq!(gateway.rate_limit.max_requests_per_minute, 2);
        assert_eq!(gateway.rate_limit.max_requests_per_day, 100);
        assert_eq!(gateway.circuit_breaker.failure_threshold, 3);
        assert_eq!(gateway.batch.max_batch_size, 4);
        assert_eq!(gateway.batch.pre_batch_sleep().as_millis(), 500);
        assert_eq!(gateway.batch.max_tokens_per_batch, 25_000);
        assert_eq!(gateway.logging.level, LogLevel::Debug);
        assert!(gateway.logging.json);
    }

    #[tokio::test]
    async fn test_loaded_config_builds_gateway() {
        let file = write_config("rate_limit:\n  max_requests_per_minute: 7\n");

        let config = Config::from_file(file.path()).await.unwrap();
        let gateway =
            Gateway::with_clock(config.into_gateway(), Arc::new(ManualClock::new())).unwrap();

        assert_eq!(gateway.status().rate_limit.minute_limit, 7);
        assert_eq!(gateway.config().rate_limit.max_requests_per_minute, 7);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.yaml")).await;

        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_config_error() {
        let file = write_config("rate_limit: [not, a, map");

        let result = Config::from_file(file.path()).await;

        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_values_rejected_on_load() {
        let file = write_config("backoff:\n  min_delay_ms: 10000\n  max_delay_ms: 5000\n");

        let err = Config::from_file(file.path()).await.unwrap_err();

        match err {
            GatewayError::Config(message) => assert!(message.contains("min_delay_ms")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    // ==================== Overrides ====================

    #[test]
    fn test_overrides_applied_over_yaml() {
        let mut config = GatewayConfig::from_yaml_str("batch:\n  max_batch_size: 3\n").unwrap();
        let vars: HashMap<&str, &str> = [
            ("GATEWAY_MAX_BATCH_SIZE", "8"),
            ("GATEWAY_MAX_REQUESTS_PER_DAY", " 500 "),
            ("GATEWAY_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.batch.max_batch_size, 8);
        assert_eq!(config.rate_limit.max_requests_per_day, 500);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_override_names_variable() {
        let mut config = GatewayConfig::default();

        let err = config
            .apply_overrides(|name| {
                (name == "GATEWAY_MAX_RETRIES").then(|| "many".to_string())
            })
            .unwrap_err();

        assert!(err.to_string().contains("GATEWAY_MAX_RETRIES"));
    }

    #[test]
    fn test_gateway_refuses_unbounded_jitter() {
        let config = GatewayConfig::from_yaml_str("retry:\n  jitter_max: .inf\n").unwrap();
        assert!(config.retry.jitter_max.is_infinite());

        assert!(matches!(
            Gateway::new(config),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_gateway_refuses_invalid_config() {
        let mut config = GatewayConfig::default();
        config.batch.max_tokens_per_batch = 0;

        assert!(matches!(
            Gateway::new(config),
            Err(GatewayError::Config(_))
        ));
    }
}
