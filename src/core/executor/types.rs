//! Request metadata used for usage accounting

use crate::monitoring::{RequestKind, RequestLog};
use crate::utils::tokens::estimate_tokens;

/// Describes the logical request behind an upstream call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub kind: RequestKind,
    pub batch_size: usize,
    pub prompt_tokens: u64,
    pub tokens_saved: u64,
}

impl RequestMeta {
    /// A single item sent on its own
    pub fn individual(prompt: &str) -> Self {
        Self {
            kind: RequestKind::Individual,
            batch_size: 1,
            prompt_tokens: estimate_tokens(prompt) as u64,
            tokens_saved: 0,
        }
    }

    /// Several items sharing one upstream call
    pub fn batch(batch_size: usize, prompt_tokens: u64, tokens_saved: u64) -> Self {
        Self {
            kind: RequestKind::Batch,
            batch_size,
            prompt_tokens,
            tokens_saved,
        }
    }

    pub(super) fn success_log(&self, response: &str) -> RequestLog {
        RequestLog {
            kind: self.kind,
            tokens_used: self.prompt_tokens + estimate_tokens(response) as u64,
            batch_size: self.batch_size,
            tokens_saved: self.tokens_saved,
            rate_limited: false,
        }
    }

    pub(super) fn failure_log(&self, rate_limited: bool) -> RequestLog {
        RequestLog {
            kind: self.kind,
            tokens_used: self.prompt_tokens,
            batch_size: self.batch_size,
            tokens_saved: 0,
            rate_limited,
        }
    }
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self {
            kind: RequestKind::Individual,
            batch_size: 1,
            prompt_tokens: 0,
            tokens_saved: 0,
        }
    }
}
