//! Sliding-window admission limits

use super::*;
use serde::{Deserialize, Serialize};

/// Request ceilings enforced before every upstream call
///
/// The defaults sit below the upstream's advertised free-tier limits so that
/// several gateway instances can coexist without a shared store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Requests admitted in any trailing 60 seconds
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,
    /// Requests admitted in any trailing 24 hours
    #[serde(default = "default_max_requests_per_day")]
    pub max_requests_per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: default_max_requests_per_minute(),
            max_requests_per_day: default_max_requests_per_day(),
        }
    }
}
