//! Recovering structure from opaque upstream error text

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// `retry after 30 seconds`, `Retry-After: 12`, `retry after 1500ms`
static RETRY_AFTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)retry[\s_-]*after\D{0,3}(\d+(?:\.\d+)?)\s*(ms|milliseconds?|s|secs?|seconds?)?")
        .expect("Invalid retry-after regex")
});

/// `retry_delay { seconds: 42 }` as emitted by protobuf-style SDK errors
static RETRY_DELAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)retry_delay\s*\{\s*seconds:\s*(\d+)")
        .expect("Invalid retry_delay regex")
});

pub struct ErrorUtils;

impl ErrorUtils {
    /// Find an explicit retry hint in error text
    pub fn extract_retry_after(text: &str) -> Option<Duration> {
        if let Some(caps) = RETRY_DELAY_RE.captures(text) {
            if let Ok(seconds) = caps[1].parse::<u64>() {
                return Some(Duration::from_secs(seconds));
            }
        }

        let caps = RETRY_AFTER_RE.captures(text)?;
        let value: f64 = caps[1].parse().ok()?;
        let is_millis = caps
            .get(2)
            .map(|unit| unit.as_str().to_lowercase().starts_with("m"))
            .unwrap_or(false);

        if is_millis {
            Some(Duration::from_millis(value as u64))
        } else {
            Duration::try_from_secs_f64(value).ok()
        }
    }

    /// Shorten error text for log lines and stored events
    pub fn truncate_message(message: &str, max_chars: usize) -> String {
        if message.chars().count() <= max_chars {
            return message.to_string();
        }
        let head: String = message.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
