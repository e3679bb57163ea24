//! Shop directory errors

use thiserror::Error;

use core_kernel::PortError;
use crate::access::AccessError;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Shop not found: {0}")]
    NotFound(String),

    #[error("Username '{0}' is already registered")]
    UsernameTaken(String),

    /// Unknown user, wrong password or wrong role; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied: {0}")]
    Forbidden(#[from] AccessError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage unavailable during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: PortError,
    },
}

impl ShopError {
    /// Wraps a port failure; data the store refused stays a validation error
    pub fn storage(operation: &'static str) -> impl FnOnce(PortError) -> Self {
        move |source| match source {
            PortError::Validation { message, .. } => ShopError::Validation(message),
            source => ShopError::Storage { operation, source },
        }
    }
}
