//! Typed error enum for the service layer.
//!
//! Per-item failures are values of this type. The bulk coordinator records
//! them and moves on.

use std::time::Duration;

use pricetrail_core::IdentityError;
use pricetrail_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying identity, storage and timeout failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Observation lacks a platform or product id.
    #[error(transparent)]
    MissingIdentity(#[from] IdentityError),

    /// Storage operation failed (DB, duplicate, conflict, etc.).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The storage call for one merge did not finish in time.
    #[error("storage timed out after {after:?} merging {unique_id}")]
    Timeout { unique_id: String, after: Duration },

    /// Caller provided invalid input (negative threshold, NaN).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Timeout { .. } => true,
            Self::MissingIdentity(_) | Self::InvalidInput(_) => false,
        }
    }

    /// Whether the observation itself is unusable, as opposed to storage failing.
    pub fn is_identity_error(&self) -> bool {
        matches!(self, Self::MissingIdentity(_) | Self::Storage(StorageError::Identity(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_transient_identity_is_not() {
        let timeout =
            ServiceError::Timeout { unique_id: "amazon_X1".into(), after: Duration::from_secs(1) };
        assert!(timeout.is_transient());
        assert!(timeout.to_string().contains("amazon_X1"));

        let identity = ServiceError::from(IdentityError::MissingPlatform);
        assert!(!identity.is_transient());
        assert!(identity.is_identity_error());
    }

    #[test]
    fn storage_conflict_is_transient() {
        let err = ServiceError::from(StorageError::Conflict {
            unique_id: "amazon_X1".into(),
            attempts: 3,
        });
        assert!(err.is_transient());
        assert!(!err.is_identity_error());
    }
}
