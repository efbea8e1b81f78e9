//! Error types for endpoint resolution.

use thiserror::Error;

/// Errors raised while parsing or resolving endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Malformed CIDR prefix
    #[error("invalid IP prefix: {0}")]
    InvalidPrefix(String),

    /// The registry could not be reached
    #[error("endpoint registry unavailable: {0}")]
    Unavailable(String),
}
