use thiserror::Error;

use crate::domain::claim::{ClaimId, ClaimStatus};

/// Failures reported by the claim store, directory, notification and audit collaborators.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("claim `{0}` was not found")]
    NotFound(ClaimId),
    #[error("claim `{claim_id}` was modified concurrently")]
    ConcurrentModification { claim_id: ClaimId },
    #[error("{dependency} unavailable: {message}")]
    Unavailable { dependency: String, message: String },
}

impl StoreError {
    pub fn unavailable(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable { dependency: dependency.into(), message: message.into() }
    }
}

/// Conditions the caller of a routing step has to act on. Soft conditions
/// such as an unassigned approver are reported on the success path instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("status `{status}` has no stage in the approval pipeline")]
    InvalidStatus { status: ClaimStatus },
    #[error("claim `{claim_id}` was not found")]
    ClaimNotFound { claim_id: ClaimId },
    #[error("claim `{claim_id}` changed while routing; reload and retry")]
    ConcurrentModification { claim_id: ClaimId },
    #[error("{dependency} unavailable: {message}")]
    DependencyUnavailable { dependency: String, message: String },
}

impl RoutingError {
    pub fn dependency_unavailable(
        dependency: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DependencyUnavailable { dependency: dependency.into(), message: message.into() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidStatus { .. } => "invalid_status",
            Self::ClaimNotFound { .. } => "claim_not_found",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::DependencyUnavailable { .. } => "dependency_unavailable",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. } | Self::DependencyUnavailable { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidStatus { .. } | Self::ClaimNotFound { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ConcurrentModification { .. } => {
                "The claim was updated by someone else. Reload it and try again."
            }
            Self::DependencyUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
        }
    }
}

impl From<StoreError> for RoutingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(claim_id) => Self::ClaimNotFound { claim_id },
            StoreError::ConcurrentModification { claim_id } => {
                Self::ConcurrentModification { claim_id }
            }
            StoreError::Unavailable { dependency, message } => {
                Self::DependencyUnavailable { dependency, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::claim::{ClaimId, ClaimStatus};
    use crate::errors::{RoutingError, StoreError};

    #[test]
    fn caller_input_errors_are_not_retryable() {
        let invalid = RoutingError::InvalidStatus { status: ClaimStatus::new("archived") };
        let missing = RoutingError::ClaimNotFound { claim_id: ClaimId("c-404".to_owned()) };

        assert!(!invalid.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(invalid.code(), "invalid_status");
        assert_eq!(
            missing.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn store_conflict_maps_to_retryable_concurrent_modification() {
        let error = RoutingError::from(StoreError::ConcurrentModification {
            claim_id: ClaimId("c-1".to_owned()),
        });

        assert!(matches!(error, RoutingError::ConcurrentModification { .. }));
        assert!(error.is_retryable());
    }

    #[test]
    fn store_outage_maps_to_dependency_unavailable() {
        let error = RoutingError::from(StoreError::unavailable("claim store", "lock timeout"));

        assert_eq!(error.code(), "dependency_unavailable");
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "claim store unavailable: lock timeout");
    }
}
