//! Per-item parse failures inside a batch response

use thiserror::Error;

/// Why one item of a combined response could not be demultiplexed
///
/// Never returned to callers: the batch scheduler turns it into a fallback
/// result and records it with the usage monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchParseError {
    #[error("No block labelled ITEM_{position} in the response")]
    MissingLabel { position: usize },

    #[error("Block for ITEM_{position} is malformed: {reason}")]
    MalformedBlock { position: usize, reason: String },
}

impl BatchParseError {
    pub fn position(&self) -> usize {
        match self {
            Self::MissingLabel { position } | Self::MalformedBlock { position, .. } => *position,
        }
    }
}
