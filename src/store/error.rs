use crate::intent::ServiceId;

/// Errors that can occur during store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Concurrent writers kept winning the conditional replace
    #[error("store update for service {service_id} failed after {attempts} attempts")]
    TransientFailure { service_id: ServiceId, attempts: u32 },
}
