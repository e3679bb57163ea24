//! Claims handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimDetail, ClaimListing, FileClaim, TransitionRequest};
use domain_shop::Caller;

use crate::dto::claims::{AcceptRequest, ChangeStatusRequest, QueueQuery, RejectRequest, TagWarrantyRequest};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiJson, ApiQuery};
use crate::AppState;

fn claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    parse_id(raw, "claim")
}

/// Files a claim for the caller's shop
pub async fn file_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<FileClaim>,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    let claim = state.workflow.file_claim(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

/// Claims of the caller's shop
pub async fn list_shop_claims(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ClaimListing>>, ApiError> {
    Ok(Json(state.workflow.claims_for_shop(&caller).await?))
}

pub async fn close_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Claim>, ApiError> {
    Ok(Json(state.workflow.close(&caller, claim_id(&id)?).await?))
}

/// `?status=unacknowledged|pending|history`
pub async fn claim_queue(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<QueueQuery>,
) -> Result<Json<Vec<ClaimListing>>, ApiError> {
    let queue = query.queue()?;
    Ok(Json(state.workflow.claim_queue(&caller, queue).await?))
}

pub async fn claim_detail(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ClaimDetail>, ApiError> {
    Ok(Json(state.workflow.claim_detail(&caller, claim_id(&id)?).await?))
}

pub async fn tag_warranty(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<TagWarrantyRequest>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state
        .workflow
        .tag_warranty(&caller, claim_id(&id)?, request.warranty_id)
        .await?;
    Ok(Json(claim))
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangeStatusRequest>,
) -> Result<Json<Claim>, ApiError> {
    let id = claim_id(&id)?;
    let transition = request.into_transition()?;
    Ok(Json(state.workflow.transition(&caller, id, transition).await?))
}

/// Acknowledges an unacknowledged claim
pub async fn mark_pending(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Claim>, ApiError> {
    Ok(Json(state.workflow.acknowledge(&caller, claim_id(&id)?).await?))
}

pub async fn accept_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AcceptRequest>,
) -> Result<Json<Claim>, ApiError> {
    let id = claim_id(&id)?;
    let claim = state
        .workflow
        .transition(&caller, id, TransitionRequest::approve(request.tyre_details))
        .await?;
    Ok(Json(claim))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RejectRequest>,
) -> Result<Json<Claim>, ApiError> {
    let id = claim_id(&id)?;
    Ok(Json(state.workflow.reject(&caller, id, &request.rejection_reason).await?))
}
