//! Warranty handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use core_kernel::WarrantyId;
use domain_shop::Caller;
use domain_warranty::Warranty;

use crate::dto::warranty::{ReceiptResponse, RegisterWarrantyRequest, ValidWarrantyResponse};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiJson};
use crate::AppState;

/// Public registration by the customer
pub async fn register_warranty(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterWarrantyRequest>,
) -> Result<(StatusCode, Json<Warranty>), ApiError> {
    let warranty = state.warranties.register(request.into()).await?;
    Ok((StatusCode::CREATED, Json(warranty)))
}

/// Full history for a plate, newest first
pub async fn warranties_by_plate(
    State(state): State<AppState>,
    Path(car_plate): Path<String>,
) -> Result<Json<Vec<Warranty>>, ApiError> {
    Ok(Json(state.warranties.list_by_plate(&car_plate).await?))
}

/// The warranty a claim filed today would consume
pub async fn valid_warranty(
    State(state): State<AppState>,
    Path(car_plate): Path<String>,
) -> Result<Json<ValidWarrantyResponse>, ApiError> {
    let warranty = state.warranties.find_valid_by_plate(&car_plate).await?;
    Ok(Json(warranty.into()))
}

pub async fn warranty_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let id: WarrantyId = parse_id(&id, "warranty")?;
    let receipt = state.warranties.get_receipt(id).await?;
    Ok(Json(ReceiptResponse { receipt }))
}

/// Tagging candidates for the master tier, latest expiry first
pub async fn tagging_candidates(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(car_plate): Path<String>,
) -> Result<Json<Vec<Warranty>>, ApiError> {
    tracing::debug!(caller = %caller.username, "Listing tagging candidates");
    Ok(Json(state.warranties.find_all_valid_by_plate(&car_plate).await?))
}
