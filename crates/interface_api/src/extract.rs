//! Extractors that reject with [`ApiError`] bodies

use axum::extract::{FromRequest, FromRequestParts};
use std::str::FromStr;

use crate::error::ApiError;

/// `Json<T>` whose rejection is a 400 with the standard error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query<T>` whose rejection is a 400 with the standard error body
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Parses a path identifier, accepting both `CLM-<uuid>` and a bare uuid
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid {} id", raw, what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ClaimId;

    #[test]
    fn test_parse_id_accepts_both_forms() {
        let id = ClaimId::new_v7();
        assert_eq!(parse_id::<ClaimId>(&id.to_string(), "claim").unwrap(), id);
        assert_eq!(parse_id::<ClaimId>(&id.as_uuid().to_string(), "claim").unwrap(), id);
        assert!(matches!(
            parse_id::<ClaimId>("nope", "claim"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
