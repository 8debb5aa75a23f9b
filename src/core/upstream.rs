//! The one collaborator the gateway calls out to

use async_trait::async_trait;

use crate::utils::error::UpstreamError;

/// Performs a single upstream call
///
/// Implementations should report failures with a typed
/// [`UpstreamErrorKind`](crate::utils::error::UpstreamErrorKind) when the
/// SDK exposes a status, and fall back to
/// [`UpstreamError::from_message`] otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Send `prompt` and return the response text
    async fn call(&self, prompt: &str) -> Result<String, UpstreamError>;
}
