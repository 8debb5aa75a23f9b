//! Batch scheduling
//!
//! Bundles several items into one labelled upstream prompt, submits the
//! combined prompts sequentially through the request executor and splits the
//! response back into one result per item. Items whose block cannot be
//! parsed, or whose batch fails for good, receive a fallback result so every
//! run returns exactly one entry per input.

mod parser;
mod partition;
mod prompt;
mod scheduler;
mod types;


pub use parser::parse_response;
pub use partition::{compress_item, partition};
pub use prompt::{analysis_label, build_prompt, item_label};
pub use scheduler::{BatchScheduler, TOKENS_SAVED_PER_BATCHED_ITEM};
pub use types::{
    AnalysisKind, BatchJob, BatchJobState, BatchOutcome, BatchReport, FallbackReason, ItemResult,
    ItemSource, RiskLevel,
};
