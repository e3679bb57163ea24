//! Claims DTOs

use serde::Deserialize;

use core_kernel::WarrantyId;
use domain_claims::{ClaimError, ClaimQueue, TransitionRequest, TransitionTarget, TyreLineItem};

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
}

impl QueueQuery {
    pub fn queue(&self) -> Result<ClaimQueue, ClaimError> {
        self.status
            .as_deref()
            .ok_or_else(|| ClaimError::validation("the status query parameter is required"))?
            .parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    #[serde(default)]
    pub tyre_details: Vec<TyreLineItem>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct TagWarrantyRequest {
    pub warranty_id: WarrantyId,
}

/// Generic transition; dispatches to the same table as the dedicated routes
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub tyre_details: Vec<TyreLineItem>,
}

impl ChangeStatusRequest {
    pub fn into_transition(self) -> Result<TransitionRequest, ClaimError> {
        let target: TransitionTarget = self.status.trim().parse()?;
        Ok(TransitionRequest {
            target,
            rejection_reason: self.rejection_reason,
            tyres: self.tyre_details,
        })
    }
}
