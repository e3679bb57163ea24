//! Shop account management (master tier)

use axum::{extract::State, http::StatusCode, Extension, Json};

use domain_shop::{Caller, CreateAccount, Shop};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

pub async fn create_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<CreateAccount>,
) -> Result<(StatusCode, Json<Shop>), ApiError> {
    let shop = state.shops.create_account(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

/// Admin accounts, newest first
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Shop>>, ApiError> {
    Ok(Json(state.shops.list_accounts(&caller).await?))
}
