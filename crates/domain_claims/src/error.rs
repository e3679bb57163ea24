//! Claims domain errors

use thiserror::Error;

use core_kernel::{ClaimId, PortError, WarrantyId};
use domain_shop::AccessError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),

    #[error("Warranty not found: {0}")]
    WarrantyNotFound(WarrantyId),

    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// The requested move is not in the transition table
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The claim or warranty changed underneath the request
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No valid warranty found for car plate {car_plate}")]
    NoValidWarranty { car_plate: String },

    #[error("Access denied: {0}")]
    Forbidden(#[from] AccessError),

    #[error("Storage unavailable during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: PortError,
    },
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    /// Wraps a port failure; data the store refused stays a validation error
    pub fn storage(operation: &'static str) -> impl FnOnce(PortError) -> Self {
        move |source| match source {
            PortError::Validation { message, .. } => ClaimError::Validation(message),
            source => ClaimError::Storage { operation, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_wrapper_keeps_validation() {
        let err = ClaimError::storage("insert claim")(PortError::validation("numeric field overflow"));
        assert!(matches!(err, ClaimError::Validation(_)));

        let err = ClaimError::storage("insert claim")(PortError::internal("bad row"));
        assert!(matches!(err, ClaimError::Storage { operation: "insert claim", .. }));
    }
}
