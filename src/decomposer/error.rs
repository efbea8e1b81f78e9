//! Decomposition error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that abort a whole decomposition.
///
/// Per-intent problems (unresolvable endpoints, rejected submissions) are
/// not errors; they are reported as outcomes next to their siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecomposeError {
    /// Neither directionality mode is enabled
    #[error("no directionality mode enabled: set bidirectional or unidirectional")]
    NoDirectionality,

    #[error(transparent)]
    Store(#[from] StoreError),
}
