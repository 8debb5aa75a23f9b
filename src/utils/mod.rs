//! Utility modules for the gateway
//!
//! - **error**: error taxonomy, circuit breaker and retry schedule
//! - **logging**: tracing subscriber setup
//! - **time**: the clock abstraction shared by every component
//! - **tokens**: prompt size estimates

pub(crate) mod bounded;
pub mod error;
pub mod logging;
pub mod time;
pub mod tokens;

pub use error::{ErrorUtils, GatewayError, Result, UpstreamError, UpstreamErrorKind};
pub use logging::{LogLevel, init_logging};
pub use time::{Clock, ManualClock, SystemClock};
