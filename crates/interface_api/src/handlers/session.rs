//! Login, token refresh and logout

use axum::{extract::State, Extension, Json};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::describe_validation;
use domain_shop::{Caller, Role, Shop, ShopError};

use crate::auth::{hash_token, AuthError, TokenClaims};
use crate::dto::session::{LoginRequest, LogoutResponse, RefreshRequest, SessionResponse};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    login(&state, request, Role::Admin).await.map(Json)
}

pub async fn master_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    login(&state, request, Role::Master).await.map(Json)
}

#[instrument(skip(state, request), fields(username = %request.username, role = %role))]
async fn login(state: &AppState, request: LoginRequest, role: Role) -> Result<SessionResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(describe_validation(&e)))?;

    let shop = state
        .shops
        .authenticate(&request.username, &request.password, role)
        .await?;
    let session = open_session(state, shop).await?;
    info!("Login succeeded");
    Ok(session)
}

/// Rotates a refresh token into a new token pair
///
/// The presented token is consumed atomically, so replaying it fails.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let now = state.clock.now();
    let shop_id = state
        .sessions
        .consume_refresh_token(&hash_token(request.refresh_token.trim()), now)
        .await?
        .ok_or_else(|| {
            warn!("Refresh token unknown, expired or already used");
            ApiError::from(AuthError::InvalidToken)
        })?;

    let shop = state.shops.get(shop_id).await.map_err(|e| match e {
        ShopError::NotFound(_) => ApiError::from(AuthError::InvalidToken),
        other => other.into(),
    })?;
    open_session(&state, shop).await.map(Json)
}

/// Revokes the presented access token and every refresh token of the shop
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<Json<LogoutResponse>, ApiError> {
    state
        .sessions
        .revoke_access_token(&claims.jti, claims.expires_at())
        .await?;
    let revoked = state
        .sessions
        .revoke_refresh_tokens(caller.shop_id, state.clock.now())
        .await?;

    info!(username = %caller.username, revoked_refresh_tokens = revoked, "Logged out");
    Ok(Json(LogoutResponse {
        revoked_refresh_tokens: revoked,
    }))
}

async fn open_session(state: &AppState, shop: Shop) -> Result<SessionResponse, ApiError> {
    let now = state.clock.now();
    let access = state.tokens.issue_access(&shop, now)?;
    let (refresh_token, record) = state.tokens.mint_refresh(shop.id, now);
    state.sessions.store_refresh_token(record).await?;

    Ok(SessionResponse {
        token: access.token,
        refresh_token,
        expires_at: access.expires_at,
        shop,
    })
}
