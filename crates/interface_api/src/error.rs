//! API error handling

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use core_kernel::PortError;
use domain_claims::ClaimError;
use domain_shop::ShopError;
use domain_warranty::WarrantyError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A transition outside the table; `allowed` lists the valid next steps
    #[error("{message}")]
    InvalidTransition { message: String, allowed: Vec<String> },

    /// Store failure; the text is logged, never returned
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::InvalidTransition { message, allowed } => {
                (StatusCode::CONFLICT, "invalid_transition", message, Some(allowed))
            }
            ApiError::StorageUnavailable(msg) => {
                error!(error = %msg, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_unavailable",
                    "The store is temporarily unavailable".to_string(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotFound(_)
            | ClaimError::WarrantyNotFound(_)
            | ClaimError::ShopNotFound(_)
            | ClaimError::NoValidWarranty { .. } => ApiError::NotFound(err.to_string()),
            ClaimError::InvalidTransition { ref allowed, .. } => ApiError::InvalidTransition {
                allowed: allowed.clone(),
                message: err.to_string(),
            },
            ClaimError::Validation(msg) => ApiError::Validation(msg),
            ClaimError::Conflict(msg) => ApiError::Conflict(msg),
            ClaimError::Forbidden(access) => ApiError::Forbidden(access.to_string()),
            ClaimError::Storage { .. } => ApiError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<WarrantyError> for ApiError {
    fn from(err: WarrantyError) -> Self {
        match err {
            WarrantyError::Validation(msg) => ApiError::Validation(msg),
            WarrantyError::NotFound(_) => ApiError::NotFound(err.to_string()),
            WarrantyError::Storage { .. } => ApiError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Validation(msg) => ApiError::Validation(msg),
            ShopError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ShopError::UsernameTaken(_) => ApiError::Conflict(err.to_string()),
            ShopError::InvalidCredentials => ApiError::Unauthorized("invalid credentials".to_string()),
            ShopError::Forbidden(access) => ApiError::Forbidden(access.to_string()),
            ShopError::Hashing(msg) => ApiError::Internal(msg),
            ShopError::Storage { .. } => ApiError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => ApiError::Internal(msg),
            other => {
                warn!(reason = %other, "Rejected credential");
                ApiError::Unauthorized(other.to_string())
            }
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { message, .. } => ApiError::Validation(message),
            PortError::Conflict { message } => ApiError::Conflict(message),
            other => ApiError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
