//! Claim aggregate and the status transition table

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, ShopId, WarrantyId};
use crate::error::ClaimError;
use crate::settlement::TyreDetail;

/// Claim status
///
/// ```text
/// unacknowledged -> pending -> approved | rejected
/// ```
///
/// Closure is a separate flag (`date_closed`) on approved or rejected claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Filed by a shop, not yet seen by the master tier
    Unacknowledged,
    /// Acknowledged and awaiting a decision
    Pending,
    /// Settled with tyre replacements
    Approved,
    /// Settled with a rejection reason
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Unacknowledged,
        ClaimStatus::Pending,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Unacknowledged => "unacknowledged",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected claims carry a settlement date
    pub fn is_settled(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }

    /// The transition table
    pub fn allowed_targets(&self, closed: bool) -> &'static [TransitionTarget] {
        match (self, closed) {
            (ClaimStatus::Unacknowledged, _) => &[TransitionTarget::Pending],
            (ClaimStatus::Pending, _) => &[TransitionTarget::Approved, TransitionTarget::Rejected],
            (ClaimStatus::Approved | ClaimStatus::Rejected, false) => &[TransitionTarget::Closed],
            (ClaimStatus::Approved | ClaimStatus::Rejected, true) => &[],
        }
    }

    pub fn can_transition_to(&self, closed: bool, target: TransitionTarget) -> bool {
        self.allowed_targets(closed).contains(&target)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status a caller may ask a claim to move to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTarget {
    Unacknowledged,
    Pending,
    Approved,
    Rejected,
    /// Sets the closure flag
    Closed,
}

impl TransitionTarget {
    pub const ALL: [TransitionTarget; 5] = [
        TransitionTarget::Unacknowledged,
        TransitionTarget::Pending,
        TransitionTarget::Approved,
        TransitionTarget::Rejected,
        TransitionTarget::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionTarget::Unacknowledged => "unacknowledged",
            TransitionTarget::Pending => "pending",
            TransitionTarget::Approved => "approved",
            TransitionTarget::Rejected => "rejected",
            TransitionTarget::Closed => "closed",
        }
    }
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionTarget {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransitionTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| ClaimError::validation(format!("unknown claim status '{}'", s)))
    }
}

/// Named claim lists for the master tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimQueue {
    Unacknowledged,
    Pending,
    /// Approved and rejected claims
    History,
}

impl ClaimQueue {
    pub fn statuses(&self) -> &'static [ClaimStatus] {
        match self {
            ClaimQueue::Unacknowledged => &[ClaimStatus::Unacknowledged],
            ClaimQueue::Pending => &[ClaimStatus::Pending],
            ClaimQueue::History => &[ClaimStatus::Approved, ClaimStatus::Rejected],
        }
    }
}

impl FromStr for ClaimQueue {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unacknowledged" => Ok(ClaimQueue::Unacknowledged),
            "pending" => Ok(ClaimQueue::Pending),
            "history" => Ok(ClaimQueue::History),
            other => Err(ClaimError::validation(format!(
                "unknown claim queue '{}', expected unacknowledged, pending or history",
                other
            ))),
        }
    }
}

/// A warranty claim filed by a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// Consumed warranty, absent until bound at creation or tagged
    pub warranty_id: Option<WarrantyId>,
    pub shop_id: ShopId,
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
    pub date_settled: Option<DateTime<Utc>>,
    pub date_closed: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub car_plate: String,
    /// Sum of the tyre line item costs; zero unless approved
    pub total_cost: Decimal,
    pub tyre_details: Vec<TyreDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    pub fn is_closed(&self) -> bool {
        self.date_closed.is_some()
    }

    /// Status label used in error messages, e.g. `approved (closed)`
    pub fn stage_label(&self) -> String {
        if self.is_closed() {
            format!("{} (closed)", self.status)
        } else {
            self.status.to_string()
        }
    }

    pub fn allowed_targets(&self) -> &'static [TransitionTarget] {
        self.status.allowed_targets(self.is_closed())
    }

    /// Checks a requested transition against the table
    ///
    /// Closing an already closed claim is a `Conflict`; every other pair not
    /// in the table is an `InvalidTransition`.
    pub fn ensure_can_transition(&self, target: TransitionTarget) -> Result<(), ClaimError> {
        if target == TransitionTarget::Closed && self.is_closed() {
            return Err(ClaimError::Conflict(format!("claim {} is already closed", self.id)));
        }
        if self.status.can_transition_to(self.is_closed(), target) {
            return Ok(());
        }
        Err(ClaimError::InvalidTransition {
            from: self.stage_label(),
            to: target.to_string(),
            allowed: self.allowed_targets().iter().map(|t| t.to_string()).collect(),
        })
    }

    /// Applies a prepared change in memory
    ///
    /// Stores that cannot express the change as one conditional write use
    /// this to stage the result before committing it.
    pub fn apply(&mut self, change: &StatusChange) -> Result<(), ClaimError> {
        self.ensure_can_transition(change.target())?;

        match change {
            StatusChange::Acknowledge { at } => {
                self.status = ClaimStatus::Pending;
                self.updated_at = *at;
            }
            StatusChange::Approve { tyres, total_cost, at } => {
                self.status = ClaimStatus::Approved;
                self.tyre_details = tyres.clone();
                self.total_cost = *total_cost;
                self.date_settled = Some(*at);
                self.updated_at = *at;
            }
            StatusChange::Reject { reason, at } => {
                self.status = ClaimStatus::Rejected;
                self.rejection_reason = Some(reason.clone());
                self.date_settled = Some(*at);
                self.updated_at = *at;
            }
            StatusChange::Close { at } => {
                self.date_closed = Some(*at);
                self.updated_at = *at;
            }
        }
        Ok(())
    }

    /// Verifies the structural invariants of a stored claim
    pub fn check_invariants(&self) -> Result<(), String> {
        let rejected = self.status == ClaimStatus::Rejected;
        let has_reason = self
            .rejection_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if rejected != has_reason {
            return Err(format!(
                "rejection reason present={} but status={}",
                has_reason, self.status
            ));
        }
        if self.status.is_settled() != self.date_settled.is_some() {
            return Err(format!("date_settled does not match status {}", self.status));
        }
        if self.date_closed.is_some() && !self.status.is_settled() {
            return Err(format!("claim closed while {}", self.status));
        }
        if self.status == ClaimStatus::Approved {
            if self.tyre_details.is_empty() {
                return Err("approved claim without tyre details".to_string());
            }
        } else if !self.tyre_details.is_empty() {
            return Err(format!("tyre details on a {} claim", self.status));
        }
        let sum: Decimal = self.tyre_details.iter().map(|t| t.cost).sum();
        if sum != self.total_cost {
            return Err(format!("total_cost {} != sum of tyres {}", self.total_cost, sum));
        }
        Ok(())
    }
}

/// A validated status change, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub enum StatusChange {
    Acknowledge {
        at: DateTime<Utc>,
    },
    Approve {
        tyres: Vec<TyreDetail>,
        total_cost: Decimal,
        at: DateTime<Utc>,
    },
    Reject {
        reason: String,
        at: DateTime<Utc>,
    },
    Close {
        at: DateTime<Utc>,
    },
}

impl StatusChange {
    pub fn target(&self) -> TransitionTarget {
        match self {
            StatusChange::Acknowledge { .. } => TransitionTarget::Pending,
            StatusChange::Approve { .. } => TransitionTarget::Approved,
            StatusChange::Reject { .. } => TransitionTarget::Rejected,
            StatusChange::Close { .. } => TransitionTarget::Closed,
        }
    }

    /// Status the claim must still have when the change is written
    pub fn required_status(&self) -> &'static [ClaimStatus] {
        match self {
            StatusChange::Acknowledge { .. } => &[ClaimStatus::Unacknowledged],
            StatusChange::Approve { .. } | StatusChange::Reject { .. } => &[ClaimStatus::Pending],
            StatusChange::Close { .. } => &[ClaimStatus::Approved, ClaimStatus::Rejected],
        }
    }
}

/// A claim together with the name and contact of the owning shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimListing {
    #[serde(flatten)]
    pub claim: Claim,
    pub shop_name: Option<String>,
    pub shop_contact: Option<String>,
}

/// Input for persisting a new claim
#[derive(Debug, Clone, PartialEq)]
pub struct NewClaim {
    pub id: ClaimId,
    pub warranty_id: Option<WarrantyId>,
    pub shop_id: ShopId,
    pub status: ClaimStatus,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub car_plate: String,
    pub created_at: DateTime<Utc>,
}

impl NewClaim {
    pub fn into_claim(self) -> Claim {
        Claim {
            id: self.id,
            warranty_id: self.warranty_id,
            shop_id: self.shop_id,
            status: self.status,
            rejection_reason: None,
            date_settled: None,
            date_closed: None,
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            email: self.email,
            car_plate: self.car_plate,
            total_cost: Decimal::ZERO,
            tyre_details: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
