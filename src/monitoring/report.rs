//! Usage recommendations and report rendering

use super::types::UsageSnapshot;
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub(super) fn recommendations(usage: &UsageSnapshot) -> Vec<String> {
    let mut out = Vec::new();

    if usage.rate_limit_hits > 0 {
        out.push(format!(
            "{} rate limit hits detected. Consider increasing delays between requests or using larger batch sizes.",
            usage.rate_limit_hits
        ));
    }

    if usage.requests_last_minute > 50 {
        out.push(
            "High request frequency detected. Consider batching more requests together."
                .to_string(),
        );
    }

    if usage.avg_batch_efficiency < 2.0 && usage.requests_today > 10 {
        out.push(
            "Low batch efficiency. Try combining more operations into single requests."
                .to_string(),
        );
    }

    if usage.tokens_last_hour > 50_000 {
        out.push(
            "High token usage detected. Consider compressing inputs or using shorter prompts."
                .to_string(),
        );
    }

    if usage.batch_failures > 0 || usage.parse_failures > 0 {
        out.push(format!(
            "{} failed batches and {} unparsed items fell back to default results.",
            usage.batch_failures, usage.parse_failures
        ));
    }

    if usage.optimization_score > 80.0 {
        out.push("Excellent API optimization. Current practices are working well.".to_string());
    } else if usage.optimization_score > 60.0 {
        out.push("Good API optimization. Minor improvements possible.".to_string());
    } else {
        out.push(
            "API usage needs optimization. Focus on batching and rate limit management."
                .to_string(),
        );
    }

    out
}

pub(super) fn render(
    usage: &UsageSnapshot,
    recommendations: &[String],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Upstream Usage Report");
    let _ = writeln!(
        out,
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Current Usage Statistics");
    let _ = writeln!(out, "- Requests last minute: {}", usage.requests_last_minute);
    let _ = writeln!(out, "- Requests last hour: {}", usage.requests_last_hour);
    let _ = writeln!(out, "- Requests today: {}", usage.requests_today);
    let _ = writeln!(out, "- Tokens used (last hour): {}", usage.tokens_last_hour);
    let _ = writeln!(out, "- Total requests: {}", usage.total_requests);
    let _ = writeln!(out, "- Rate limit hits: {}", usage.rate_limit_hits);
    let _ = writeln!(out, "- Tokens saved through batching: {}", usage.total_tokens_saved);
    let _ = writeln!(out, "- Failed batches: {}", usage.batch_failures);
    let _ = writeln!(out, "- Unparsed items: {}", usage.parse_failures);
    let _ = writeln!(
        out,
        "- Average batch efficiency: {:.2}x",
        usage.avg_batch_efficiency
    );
    let _ = writeln!(
        out,
        "- Optimization score: {:.1}/100",
        usage.optimization_score
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Recommendations");
    for (i, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, rec);
    }

    out
}
