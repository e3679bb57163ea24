//! Warranty domain errors

use thiserror::Error;

use core_kernel::{PortError, WarrantyId};

#[derive(Debug, Error)]
pub enum WarrantyError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Warranty not found: {0}")]
    NotFound(WarrantyId),

    #[error("Storage unavailable during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: PortError,
    },
}

impl WarrantyError {
    pub fn validation(message: impl Into<String>) -> Self {
        WarrantyError::Validation(message.into())
    }

    /// Wraps a port failure with the name of the operation that hit it
    ///
    /// Data the store refused (too long, out of range) stays a validation error.
    pub fn storage(operation: &'static str) -> impl FnOnce(PortError) -> Self {
        move |source| match source {
            PortError::Validation { message, .. } => WarrantyError::Validation(message),
            source => WarrantyError::Storage { operation, source },
        }
    }
}
