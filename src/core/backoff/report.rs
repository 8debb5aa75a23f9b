//! Markdown rendering of the rate-limit analysis

use super::types::RateLimitAnalysis;
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub(super) fn render(analysis: &RateLimitAnalysis, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Rate Limit Recovery Analysis");
    let _ = writeln!(
        out,
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Current Status");
    let _ = writeln!(
        out,
        "- Adaptive Delay: {:.1} seconds",
        analysis.current_delay.as_secs_f64()
    );
    let _ = writeln!(out, "- Consecutive Failures: {}", analysis.consecutive_failures);
    let _ = writeln!(out, "- Consecutive Successes: {}", analysis.consecutive_successes);
    let _ = writeln!(out, "- Should Pause Requests: {}", analysis.should_pause);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Recent Rate Limit Events");
    let _ = writeln!(out, "- Last Minute: {} events", analysis.events_last_minute);
    let _ = writeln!(out, "- Last 5 Minutes: {} events", analysis.events_last_5_minutes);
    let _ = writeln!(out, "- Last Hour: {} events", analysis.events_last_hour);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Quota Type Distribution");
    if analysis.quota_distribution.is_empty() {
        let _ = writeln!(out, "- none");
    }
    for (quota_type, count) in &analysis.quota_distribution {
        let _ = writeln!(out, "- {}: {} events", quota_type, count);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Recommendation");
    let _ = writeln!(out, "{}", analysis.recommended_action.message());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Time Since Last Success");
    match analysis.time_since_last_success {
        Some(elapsed) => {
            let _ = writeln!(out, "{:.1} seconds", elapsed.as_secs_f64());
        }
        None => {
            let _ = writeln!(out, "no successful call recorded");
        }
    }

    out
}
