//! Error handling for the gateway
//!
//! This module defines all error types used throughout the gateway.

mod batch;
mod helpers;
mod types;
mod upstream;

pub use batch::BatchParseError;
pub use types::{GatewayError, Result};
pub use upstream::{UpstreamError, UpstreamErrorKind};
