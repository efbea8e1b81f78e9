use super::IntentKey;
use thiserror::Error;

/// A service id was empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("service id must not be empty")]
pub struct InvalidServiceId;

/// Errors returned by the intent framework.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentServiceError {
    /// The framework refused the intent
    #[error("intent {key} rejected: {reason}")]
    Rejected { key: IntentKey, reason: String },

    #[error("intent not found: {0}")]
    NotFound(IntentKey),

    /// The call did not complete within the request timeout
    #[error("intent {0} not acknowledged in time")]
    Timeout(IntentKey),

    #[error("intent service unavailable: {0}")]
    Unavailable(String),
}
