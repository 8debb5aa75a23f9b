//! Demultiplexing a combined response into per-item results

use super::types::{ItemResult, RiskLevel};
use crate::utils::error::BatchParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static ANALYSIS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ITEM_(\d+)_ANALYSIS:").expect("Invalid analysis label regex"));

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    risk_level: String,
    #[serde(alias = "explanation")]
    analysis: String,
}

struct Label {
    position: usize,
    start: usize,
    end: usize,
}

/// Parse `response` for `expected` items
///
/// Entry `i` holds the result for `ITEM_{i + 1}`. A block runs from its
/// label to the next label of any number, or to the end of the text.
pub fn parse_response(
    response: &str,
    expected: usize,
) -> Vec<std::result::Result<ItemResult, BatchParseError>> {
    let labels: Vec<Label> = ANALYSIS_LABEL
        .captures_iter(response)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let position = caps.get(1)?.as_str().parse().ok()?;
            Some(Label {
                position,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect();

    (1..=expected)
        .map(|position| {
            let idx = labels
                .iter()
                .position(|label| label.position == position)
                .ok_or(BatchParseError::MissingLabel { position })?;
            let block_end = labels
                .get(idx + 1)
                .map_or(response.len(), |next| next.start);
            parse_block(&response[labels[idx].end..block_end], position)
        })
        .collect()
}

fn parse_block(block: &str, position: usize) -> std::result::Result<ItemResult, BatchParseError> {
    let cleaned = strip_fences(block);
    let json = extract_object(&cleaned).ok_or_else(|| BatchParseError::MalformedBlock {
        position,
        reason: "no JSON object found".to_string(),
    })?;

    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| BatchParseError::MalformedBlock {
            position,
            reason: e.to_string(),
        })?;

    Ok(ItemResult::upstream(
        RiskLevel::normalize(&raw.risk_level),
        raw.analysis.trim(),
    ))
}

fn strip_fences(block: &str) -> String {
    block.replace("```json", "").replace("```", "")
}

/// Slice from the first `{` to the last `}`
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
