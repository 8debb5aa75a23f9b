//! Batch scheduling types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Wording used for the combined prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Per-item risk assessment
    #[default]
    Risk,
    /// Plain-language explanation of each item
    Summary,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Summary => "summary",
        }
    }
}

/// Normalised risk level of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Case-insensitive; anything unrecognised is `Medium`
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(level)
    }
}

/// Where an item result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Upstream,
    Fallback,
}

/// Why an item got the fallback result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The item's block was missing or unparseable
    ParseFailure,
    /// The whole batch failed after its re-submission
    BatchFailure,
    /// Processing stopped before the item was submitted
    Cancelled,
}

impl FallbackReason {
    fn explanation(&self) -> &'static str {
        match self {
            Self::ParseFailure => "Batch analysis incomplete for this item - manual review recommended",
            Self::BatchFailure => "Batch processing error - manual review needed",
            Self::Cancelled => "Analysis cancelled before this item was processed",
        }
    }
}

/// Outcome for one submitted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub source: ItemSource,
}

impl ItemResult {
    pub fn upstream(risk_level: RiskLevel, explanation: impl Into<String>) -> Self {
        Self {
            risk_level,
            explanation: explanation.into(),
            source: ItemSource::Upstream,
        }
    }

    /// `Medium` with placeholder text
    pub fn fallback(reason: FallbackReason) -> Self {
        Self {
            risk_level: RiskLevel::Medium,
            explanation: reason.explanation().to_string(),
            source: ItemSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ItemSource::Fallback
    }
}

/// Lifecycle of one combined request
///
/// `Queued -> Submitted -> {Parsed | FailedRetry -> Submitted | FailedFinal}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobState {
    Queued,
    Submitted,
    Parsed,
    FailedRetry,
    FailedFinal,
}

impl BatchJobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Parsed | Self::FailedFinal)
    }

    pub fn can_transition_to(&self, next: BatchJobState) -> bool {
        use BatchJobState::*;
        matches!(
            (self, next),
            (Queued, Submitted)
                | (Queued, FailedFinal)
                | (Submitted, Parsed)
                | (Submitted, FailedRetry)
                | (Submitted, FailedFinal)
                | (FailedRetry, Submitted)
                | (FailedRetry, FailedFinal)
        )
    }
}

impl fmt::Display for BatchJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Queued => "queued",
            Self::Submitted => "submitted",
            Self::Parsed => "parsed",
            Self::FailedRetry => "failed-retry",
            Self::FailedFinal => "failed-final",
        };
        f.write_str(state)
    }
}

/// One combined upstream request covering a contiguous run of items
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: Uuid,
    /// Caller indices of the items, in label order (`ITEM_1` is `indices[0]`)
    pub indices: Vec<usize>,
    pub kind: AnalysisKind,
    pub prompt: String,
    pub prompt_tokens: u64,
    pub tokens_saved: u64,
    pub state: BatchJobState,
    pub submissions: u32,
    pub created_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(
        indices: Vec<usize>,
        kind: AnalysisKind,
        prompt: String,
        prompt_tokens: u64,
        tokens_saved: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            indices,
            kind,
            prompt,
            prompt_tokens,
            tokens_saved,
            state: BatchJobState::Queued,
            submissions: 0,
            created_at,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Move to `next`, logging the change
    pub fn transition(&mut self, next: BatchJobState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "Batch job {}: unexpected transition {} -> {}",
                self.id, self.state, next
            );
        } else {
            debug!("Batch job {}: {} -> {}", self.id, self.state, next);
        }
        if next == BatchJobState::Submitted {
            self.submissions += 1;
        }
        self.state = next;
    }
}

/// Counters describing one `submit_batch` run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Jobs sent upstream at least once
    pub jobs_submitted: usize,
    /// Re-submissions after a failed first attempt
    pub requeued: usize,
    pub parsed: usize,
    pub failed_final: usize,
    /// Items whose result is a fallback, for any reason
    pub fallback_items: usize,
}

/// Results keyed by caller index together with the run's counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: BTreeMap<usize, ItemResult>,
    pub report: BatchReport,
}
