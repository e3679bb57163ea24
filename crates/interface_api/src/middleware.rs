//! API middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use domain_shop::{Caller, Role};

use crate::auth::{bearer_token, AuthError, TokenClaims};
use crate::error::ApiError;
use crate::AppState;

/// Accepts any valid, unrevoked access token
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&state, request, next, None).await
}

/// Accepts shop-level (`admin`) tokens only
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&state, request, next, Some(Role::Admin)).await
}

/// Accepts `master` tokens only
pub async fn require_master(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    guard(&state, request, next, Some(Role::Master)).await
}

/// Resolves the bearer token into a [`Caller`]
///
/// A missing, malformed, expired or revoked token is 401; a valid token of
/// the wrong role is 403.
async fn guard(
    state: &AppState,
    mut request: Request,
    next: Next,
    role: Option<Role>,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header)?;
    let claims = state.tokens.verify(token)?;

    if state.sessions.is_access_token_revoked(&claims.jti).await? {
        return Err(AuthError::TokenRevoked.into());
    }

    let caller = claims.caller()?;
    if let Some(required) = role {
        if caller.role != required {
            warn!(username = %caller.username, role = %caller.role, required = %required, "Role guard refused caller");
            return Err(ApiError::Forbidden(format!(
                "this endpoint requires the {} role",
                required
            )));
        }
    }

    request.extensions_mut().insert(caller);
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every guarded request with the resolved caller.
pub async fn audit_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let caller = request
        .extensions()
        .get::<Caller>()
        .map(|c| c.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    let session = request
        .extensions()
        .get::<TokenClaims>()
        .map(|c| c.jti.clone());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        caller = %caller,
        jti = ?session,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
