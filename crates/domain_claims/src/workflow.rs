//! Claim workflow service
//!
//! Every operation runs its checks in the same order: the claim must exist,
//! the caller must hold the permission (and own the claim when shop scoped),
//! the move must be in the transition table, and only then is the payload
//! validated and the conditional write issued.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{describe_validation, ClaimId, Clock, PortError, WarrantyId};
use domain_shop::{Caller, Permission, ShopPort};
use domain_warranty::{normalize_plate, Warranty, WarrantyPort};
use crate::claim::{Claim, ClaimListing, ClaimQueue, ClaimStatus, NewClaim, StatusChange, TransitionTarget};
use crate::error::ClaimError;
use crate::ports::ClaimPort;
use crate::settlement::{rejection_reason, Settlement, TyreLineItem};

/// Business switches of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// New claims start `unacknowledged` rather than `pending`
    pub requires_acknowledgment: bool,
    /// Filing a claim consumes the plate's valid warranty immediately
    pub bind_warranty_on_create: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            requires_acknowledgment: true,
            bind_warranty_on_create: true,
        }
    }
}

/// Claim as submitted by a shop
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FileClaim {
    #[validate(length(min = 1, max = 200, message = "customer name must be 1 to 200 characters"))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 50, message = "phone number must be 1 to 50 characters"))]
    pub phone_number: String,
    #[validate(
        email(message = "email is not a valid address"),
        length(max = 254, message = "email may have at most 254 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 20, message = "car plate must be 1 to 20 characters"))]
    pub car_plate: String,
}

impl FileClaim {
    fn normalized(self) -> Self {
        Self {
            customer_name: self.customer_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            car_plate: normalize_plate(&self.car_plate),
        }
    }
}

/// A requested status move with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub target: TransitionTarget,
    pub rejection_reason: Option<String>,
    pub tyres: Vec<TyreLineItem>,
}

impl TransitionRequest {
    pub fn to(target: TransitionTarget) -> Self {
        Self {
            target,
            rejection_reason: None,
            tyres: Vec::new(),
        }
    }

    pub fn acknowledge() -> Self {
        Self::to(TransitionTarget::Pending)
    }

    pub fn approve(tyres: Vec<TyreLineItem>) -> Self {
        Self {
            tyres,
            ..Self::to(TransitionTarget::Approved)
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            rejection_reason: Some(reason.into()),
            ..Self::to(TransitionTarget::Rejected)
        }
    }

    pub fn close() -> Self {
        Self::to(TransitionTarget::Closed)
    }

    fn permission(&self) -> Permission {
        match self.target {
            TransitionTarget::Closed => Permission::CloseClaim,
            _ => Permission::AdjudicateClaim,
        }
    }
}

/// A claim with the warranty it consumed
#[derive(Debug, Clone, Serialize)]
pub struct ClaimDetail {
    pub claim: ClaimListing,
    pub warranty: Option<Warranty>,
}

#[derive(Clone)]
pub struct ClaimWorkflow {
    claims: Arc<dyn ClaimPort>,
    warranties: Arc<dyn WarrantyPort>,
    shops: Arc<dyn ShopPort>,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
}

impl ClaimWorkflow {
    pub fn new(
        claims: Arc<dyn ClaimPort>,
        warranties: Arc<dyn WarrantyPort>,
        shops: Arc<dyn ShopPort>,
        clock: Arc<dyn Clock>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            claims,
            warranties,
            shops,
            clock,
            config,
        }
    }

    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    /// Files a claim for the caller's shop against the plate's valid warranty
    ///
    /// # Errors
    ///
    /// `NoValidWarranty` when the plate has no unconsumed, unexpired
    /// warranty; no claim is created in that case. `Conflict` when a
    /// concurrent claim consumed the warranty first.
    #[instrument(skip(self, caller, request), fields(shop_id = %caller.shop_id))]
    pub async fn file_claim(&self, caller: &Caller, request: FileClaim) -> Result<Claim, ClaimError> {
        caller.authorize(Permission::FileClaim)?;
        let request = request.normalized();
        request
            .validate()
            .map_err(|e| ClaimError::Validation(describe_validation(&e)))?;

        self.shops
            .get(caller.shop_id)
            .await
            .map_err(ClaimError::storage("load shop"))?
            .ok_or_else(|| ClaimError::ShopNotFound(caller.shop_id.to_string()))?;

        let warranty = self
            .warranties
            .find_valid_by_plate(&request.car_plate, self.clock.today())
            .await
            .map_err(ClaimError::storage("find valid warranty"))?
            .ok_or_else(|| ClaimError::NoValidWarranty {
                car_plate: request.car_plate.clone(),
            })?;

        let status = if self.config.requires_acknowledgment {
            ClaimStatus::Unacknowledged
        } else {
            ClaimStatus::Pending
        };
        let new = NewClaim {
            id: ClaimId::new_v7(),
            warranty_id: self.config.bind_warranty_on_create.then_some(warranty.id),
            shop_id: caller.shop_id,
            status,
            customer_name: request.customer_name,
            phone_number: request.phone_number,
            email: request.email,
            car_plate: request.car_plate,
            created_at: self.clock.now(),
        };

        let claim = self.claims.insert(new).await.map_err(|e| {
            if e.is_conflict() {
                ClaimError::Conflict(format!(
                    "warranty {} was consumed by a concurrent claim",
                    warranty.id
                ))
            } else {
                ClaimError::storage("insert claim")(e)
            }
        })?;

        info!(
            claim_id = %claim.id,
            warranty_id = ?claim.warranty_id,
            status = %claim.status,
            "Claim filed"
        );
        Ok(claim)
    }

    /// Claims of the caller's own shop, newest first
    pub async fn claims_for_shop(&self, caller: &Caller) -> Result<Vec<ClaimListing>, ClaimError> {
        caller.authorize(Permission::ViewOwnClaims)?;
        self.claims
            .list_by_shop(caller.shop_id)
            .await
            .map_err(ClaimError::storage("list shop claims"))
    }

    /// One of the master-tier queues, newest first
    pub async fn claim_queue(&self, caller: &Caller, queue: ClaimQueue) -> Result<Vec<ClaimListing>, ClaimError> {
        caller.authorize(Permission::ViewAnyClaim)?;
        self.claims
            .list_by_statuses(queue.statuses())
            .await
            .map_err(ClaimError::storage("list claim queue"))
    }

    pub async fn claim_detail(&self, caller: &Caller, id: ClaimId) -> Result<ClaimDetail, ClaimError> {
        let permission = if caller.role.is_shop_scoped() {
            Permission::ViewOwnClaims
        } else {
            Permission::ViewAnyClaim
        };
        caller.authorize(permission)?;
        let listing = self.load(id).await?;
        caller.authorize_for_shop(permission, listing.claim.shop_id)?;

        let warranty = match listing.claim.warranty_id {
            Some(warranty_id) => self
                .warranties
                .get(warranty_id)
                .await
                .map_err(ClaimError::storage("load claim warranty"))?,
            None => None,
        };
        Ok(ClaimDetail {
            claim: listing,
            warranty,
        })
    }

    /// Moves a claim along the transition table
    ///
    /// # Errors
    ///
    /// - `NotFound` when the claim does not exist
    /// - `Forbidden` when the caller lacks the permission for the move or,
    ///   for shop-scoped callers, does not own the claim
    /// - `InvalidTransition` when the move is not in the table
    /// - `Validation` when the payload is missing or malformed
    /// - `Conflict` when closing a closed claim or when the claim changed
    ///   between the read and the conditional write
    #[instrument(skip(self, caller, request), fields(caller = %caller.username, to = %request.target))]
    pub async fn transition(
        &self,
        caller: &Caller,
        id: ClaimId,
        request: TransitionRequest,
    ) -> Result<Claim, ClaimError> {
        let permission = request.permission();
        caller.authorize(permission)?;
        let claim = self.load(id).await?.claim;
        caller.authorize_for_shop(permission, claim.shop_id)?;
        claim.ensure_can_transition(request.target)?;

        let now = self.clock.now();
        let change = match request.target {
            TransitionTarget::Pending => StatusChange::Acknowledge { at: now },
            TransitionTarget::Approved => {
                let (tyres, total_cost) = Settlement::new(request.tyres)?.into_details(id, now);
                StatusChange::Approve { tyres, total_cost, at: now }
            }
            TransitionTarget::Rejected => {
                let reason = rejection_reason(request.rejection_reason.as_deref().unwrap_or_default())?;
                StatusChange::Reject { reason, at: now }
            }
            TransitionTarget::Closed => StatusChange::Close { at: now },
            // never in the table; ensure_can_transition already refused it
            TransitionTarget::Unacknowledged => {
                return Err(ClaimError::InvalidTransition {
                    from: claim.stage_label(),
                    to: request.target.to_string(),
                    allowed: claim.allowed_targets().iter().map(|t| t.to_string()).collect(),
                })
            }
        };

        let from = claim.stage_label();
        let updated = self
            .claims
            .apply_change(id, change)
            .await
            .map_err(|e| Self::write_error(id, "apply claim transition", e))?;

        info!(
            claim_id = %id,
            from = %from,
            to = %request.target,
            total_cost = %updated.total_cost,
            "Claim status changed"
        );
        Ok(updated)
    }

    pub async fn acknowledge(&self, caller: &Caller, id: ClaimId) -> Result<Claim, ClaimError> {
        self.transition(caller, id, TransitionRequest::acknowledge()).await
    }

    pub async fn approve(&self, caller: &Caller, id: ClaimId, tyres: Vec<TyreLineItem>) -> Result<Claim, ClaimError> {
        self.transition(caller, id, TransitionRequest::approve(tyres)).await
    }

    pub async fn reject(&self, caller: &Caller, id: ClaimId, reason: &str) -> Result<Claim, ClaimError> {
        self.transition(caller, id, TransitionRequest::reject(reason)).await
    }

    pub async fn close(&self, caller: &Caller, id: ClaimId) -> Result<Claim, ClaimError> {
        self.transition(caller, id, TransitionRequest::close()).await
    }

    /// Binds an existing, unconsumed warranty to a pending claim that has none
    ///
    /// Re-tagging a claim that already holds a warranty is a `Conflict`.
    #[instrument(skip(self, caller), fields(caller = %caller.username))]
    pub async fn tag_warranty(
        &self,
        caller: &Caller,
        id: ClaimId,
        warranty_id: WarrantyId,
    ) -> Result<Claim, ClaimError> {
        caller.authorize(Permission::TagWarranty)?;
        let claim = self.load(id).await?.claim;

        if claim.status != ClaimStatus::Pending {
            return Err(ClaimError::InvalidTransition {
                from: claim.stage_label(),
                to: "tag_warranty".to_string(),
                allowed: claim.allowed_targets().iter().map(|t| t.to_string()).collect(),
            });
        }
        if let Some(bound) = claim.warranty_id {
            return Err(ClaimError::Conflict(format!(
                "claim {} already holds warranty {}",
                id, bound
            )));
        }

        let warranty = self
            .warranties
            .get(warranty_id)
            .await
            .map_err(ClaimError::storage("load warranty"))?
            .ok_or(ClaimError::WarrantyNotFound(warranty_id))?;
        if warranty.is_used {
            return Err(ClaimError::Conflict(format!(
                "warranty {} is already consumed by another claim",
                warranty_id
            )));
        }

        let updated = self
            .claims
            .bind_warranty(id, warranty_id, self.clock.now())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ClaimError::WarrantyNotFound(warranty_id)
                } else {
                    Self::write_error(id, "bind warranty", e)
                }
            })?;

        info!(claim_id = %id, warranty_id = %warranty_id, "Warranty tagged to claim");
        Ok(updated)
    }

    async fn load(&self, id: ClaimId) -> Result<ClaimListing, ClaimError> {
        self.claims
            .get(id)
            .await
            .map_err(ClaimError::storage("load claim"))?
            .ok_or(ClaimError::NotFound(id))
    }

    fn write_error(id: ClaimId, operation: &'static str, error: PortError) -> ClaimError {
        match error {
            PortError::Conflict { message } => {
                warn!(claim_id = %id, %message, "Conditional claim write lost a race");
                ClaimError::Conflict(message)
            }
            PortError::NotFound { .. } => ClaimError::NotFound(id),
            other => ClaimError::storage(operation)(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use core_kernel::{FixedClock, ShopId};
    use domain_shop::ports::mock::MockShopPort;
    use domain_shop::{NewShop, Role, ShopProfile};
    use domain_warranty::ports::mock::MockWarrantyPort;
    use domain_warranty::{RegisterWarranty, ValidityWindow};
    use crate::ports::mock::MockClaimPort;

    struct Fixture {
        workflow: ClaimWorkflow,
        claims: MockClaimPort,
        warranties: MockWarrantyPort,
        clock: Arc<FixedClock>,
        admin: Caller,
        other_admin: Caller,
        master: Caller,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn add_shop(shops: &MockShopPort, username: &str, role: Role) -> Caller {
        let shop = shops
            .insert(NewShop {
                id: ShopId::new_v7(),
                profile: ShopProfile {
                    shop_name: format!("{} Tyres", username),
                    address: "Jalan Sultan Idris Shah".to_string(),
                    contact: "05-2541234".to_string(),
                },
                username: username.to_string(),
                password_hash: String::new(),
                role,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        Caller::new(shop.id, username, role)
    }

    async fn fixture(config: WorkflowConfig) -> Fixture {
        let warranties = MockWarrantyPort::new();
        let shops = MockShopPort::new();
        let claims = MockClaimPort::new(warranties.clone(), shops.clone());
        let clock = Arc::new(FixedClock::on(date(2024, 1, 1)));

        let admin = add_shop(&shops, "ipoh", Role::Admin).await;
        let other_admin = add_shop(&shops, "klang", Role::Admin).await;
        let master = add_shop(&shops, "hq", Role::Master).await;

        let workflow = ClaimWorkflow::new(
            Arc::new(claims.clone()),
            Arc::new(warranties.clone()),
            Arc::new(shops),
            clock.clone(),
            config,
        );
        Fixture {
            workflow,
            claims,
            warranties,
            clock,
            admin,
            other_admin,
            master,
        }
    }

    async fn register(f: &Fixture, plate: &str, purchase_date: NaiveDate) -> Warranty {
        let new = RegisterWarranty {
            name: "Tan Ah Kow".to_string(),
            phone_number: "012-3456789".to_string(),
            email: None,
            purchase_date,
            car_plate: plate.to_string(),
            receipt: "INV-0001".to_string(),
        }
        .prepare(ValidityWindow::default(), f.clock.today(), f.clock.now())
        .unwrap();
        f.warranties.insert(new).await.unwrap()
    }

    fn file_request(plate: &str) -> FileClaim {
        FileClaim {
            customer_name: "Tan Ah Kow".to_string(),
            phone_number: "012-3456789".to_string(),
            email: Some("tan@example.com".to_string()),
            car_plate: plate.to_string(),
        }
    }

    fn tyre(brand: &str, cost: rust_decimal::Decimal) -> TyreLineItem {
        TyreLineItem {
            brand: brand.to_string(),
            size: "195/65R15".to_string(),
            cost,
        }
    }

    async fn pending_claim(f: &Fixture, plate: &str) -> Claim {
        register(f, plate, f.clock.today()).await;
        let claim = f.workflow.file_claim(&f.admin, file_request(plate)).await.unwrap();
        f.workflow.acknowledge(&f.master, claim.id).await.unwrap()
    }

    // ========================================================================
    // Filing
    // ========================================================================

    #[tokio::test]
    async fn test_claim_binds_warranty_and_consumes_it() {
        let f = fixture(WorkflowConfig::default()).await;
        let warranty = register(&f, "ABC123", date(2024, 1, 1)).await;
        assert_eq!(warranty.expiry_date, date(2024, 7, 1));

        f.clock.set_date(date(2024, 3, 1));
        let claim = f.workflow.file_claim(&f.admin, file_request("abc 123")).await.unwrap();
        assert_eq!(claim.warranty_id, Some(warranty.id));
        assert_eq!(claim.status, ClaimStatus::Unacknowledged);
        assert_eq!(claim.car_plate, "ABC123");
        assert!(f.warranties.is_consumed(warranty.id).await);

        let second = f.workflow.file_claim(&f.admin, file_request("ABC123")).await;
        assert!(matches!(second, Err(ClaimError::NoValidWarranty { ref car_plate }) if car_plate == "ABC123"));
        assert_eq!(f.claims.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_warranty_cannot_be_claimed() {
        let f = fixture(WorkflowConfig::default()).await;
        register(&f, "WXY9", date(2024, 1, 1)).await;

        f.clock.set_date(date(2024, 7, 1));
        assert!(f.workflow.file_claim(&f.admin, file_request("WXY9")).await.is_ok());

        register(&f, "JKL7", date(2024, 1, 1)).await;
        f.clock.set_date(date(2024, 7, 2));
        let result = f.workflow.file_claim(&f.admin, file_request("JKL7")).await;
        assert!(matches!(result, Err(ClaimError::NoValidWarranty { .. })));
    }

    #[tokio::test]
    async fn test_filing_without_acknowledgment_or_binding() {
        let f = fixture(WorkflowConfig {
            requires_acknowledgment: false,
            bind_warranty_on_create: false,
        })
        .await;
        let warranty = register(&f, "PKR1", date(2024, 1, 1)).await;

        let claim = f.workflow.file_claim(&f.admin, file_request("PKR1")).await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.warranty_id, None);
        assert!(!f.warranties.is_consumed(warranty.id).await);
    }

    #[tokio::test]
    async fn test_filing_requires_admin_and_fields() {
        let f = fixture(WorkflowConfig::default()).await;
        register(&f, "ABC123", date(2024, 1, 1)).await;

        let result = f.workflow.file_claim(&f.master, file_request("ABC123")).await;
        assert!(matches!(result, Err(ClaimError::Forbidden(_))));

        let mut request = file_request("ABC123");
        request.customer_name = "   ".to_string();
        let result = f.workflow.file_claim(&f.admin, request).await;
        assert!(matches!(result, Err(ClaimError::Validation(ref m)) if m.contains("customer name")));
    }

    #[tokio::test]
    async fn test_storage_outage_surfaces_as_storage_error() {
        let f = fixture(WorkflowConfig::default()).await;
        f.warranties.set_unavailable(true);
        let result = f.workflow.file_claim(&f.admin, file_request("ABC123")).await;
        assert!(matches!(result, Err(ClaimError::Storage { operation: "find valid warranty", .. })));
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    #[tokio::test]
    async fn test_approve_sums_tyre_costs() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;

        let approved = f
            .workflow
            .approve(
                &f.master,
                claim.id,
                vec![tyre("Michelin", dec!(120.50)), tyre("Bridgestone", dec!(95.00))],
            )
            .await
            .unwrap();

        assert_eq!(approved.status, ClaimStatus::Approved);
        assert_eq!(approved.total_cost, dec!(215.50));
        assert_eq!(approved.tyre_details.len(), 2);
        assert!(approved.date_settled.is_some());
        approved.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_accept_from_unacknowledged_is_invalid() {
        let f = fixture(WorkflowConfig::default()).await;
        register(&f, "ABC123", date(2024, 1, 1)).await;
        let claim = f.workflow.file_claim(&f.admin, file_request("ABC123")).await.unwrap();

        let result = f
            .workflow
            .approve(&f.master, claim.id, vec![tyre("Michelin", dec!(100))])
            .await;
        match result {
            Err(ClaimError::InvalidTransition { from, to, allowed }) => {
                assert_eq!(from, "unacknowledged");
                assert_eq!(to, "approved");
                assert_eq!(allowed, vec!["pending".to_string()]);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        let stored = f.claims.stored(claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Unacknowledged);
    }

    #[tokio::test]
    async fn test_reject_with_blank_reason_leaves_claim_pending() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;

        let result = f.workflow.reject(&f.master, claim.id, "   ").await;
        assert!(matches!(result, Err(ClaimError::Validation(_))));
        assert_eq!(f.claims.stored(claim.id).await.unwrap().status, ClaimStatus::Pending);

        let rejected = f
            .workflow
            .reject(&f.master, claim.id, " tread worn past indicator ")
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("tread worn past indicator"));
        rejected.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_approval_is_atomic_under_fault_injection() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;
        f.claims.fail_tyre_insert_at(2);

        let result = f
            .workflow
            .approve(
                &f.master,
                claim.id,
                vec![tyre("Michelin", dec!(120.50)), tyre("Bridgestone", dec!(95.00))],
            )
            .await;
        assert!(matches!(result, Err(ClaimError::Storage { .. })));

        let stored = f.claims.stored(claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Pending);
        assert!(stored.tyre_details.is_empty());
        assert_eq!(stored.total_cost, dec!(0));
        assert!(stored.date_settled.is_none());

        f.claims.fail_tyre_insert_at(0);
        let approved = f
            .workflow
            .approve(&f.master, claim.id, vec![tyre("Michelin", dec!(120.50))])
            .await
            .unwrap();
        assert_eq!(approved.tyre_details.len(), 1);
    }

    #[tokio::test]
    async fn test_double_close_is_conflict() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;
        f.workflow.reject(&f.master, claim.id, "not covered").await.unwrap();

        let closed = f.workflow.close(&f.admin, claim.id).await.unwrap();
        let first_close = closed.date_closed;
        assert!(first_close.is_some());

        f.clock.advance(chrono::Duration::hours(1));
        let again = f.workflow.close(&f.master, claim.id).await;
        assert!(matches!(again, Err(ClaimError::Conflict(_))));
        assert_eq!(f.claims.stored(claim.id).await.unwrap().date_closed, first_close);
    }

    #[tokio::test]
    async fn test_close_requires_settlement() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;
        let result = f.workflow.close(&f.admin, claim.id).await;
        assert!(matches!(result, Err(ClaimError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_admin_scope_and_role_checks() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;

        let result = f.workflow.reject(&f.admin, claim.id, "nope").await;
        assert!(matches!(result, Err(ClaimError::Forbidden(_))));

        f.workflow.reject(&f.master, claim.id, "not covered").await.unwrap();
        let result = f.workflow.close(&f.other_admin, claim.id).await;
        assert!(matches!(result, Err(ClaimError::Forbidden(_))));

        assert!(f.workflow.claims_for_shop(&f.other_admin).await.unwrap().is_empty());
        assert_eq!(f.workflow.claims_for_shop(&f.admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_claim_is_not_found() {
        let f = fixture(WorkflowConfig::default()).await;
        let result = f.workflow.acknowledge(&f.master, ClaimId::new()).await;
        assert!(matches!(result, Err(ClaimError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_only_one_wins() {
        let f = fixture(WorkflowConfig::default()).await;
        let claim = pending_claim(&f, "ABC123").await;

        let a = f.workflow.approve(&f.master, claim.id, vec![tyre("Michelin", dec!(100))]);
        let b = f.workflow.reject(&f.master, claim.id, "duplicate");
        let (a, b) = tokio::join!(a, b);
        assert!(a.is_ok() ^ b.is_ok());

        let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
        assert!(matches!(loser, ClaimError::Conflict(_) | ClaimError::InvalidTransition { .. }));
        f.claims.stored(claim.id).await.unwrap().check_invariants().unwrap();
    }

    // ========================================================================
    // Queues, detail and tagging
    // ========================================================================

    #[tokio::test]
    async fn test_queues_and_detail() {
        let f = fixture(WorkflowConfig::default()).await;
        register(&f, "AAA1", date(2024, 1, 1)).await;
        let unack = f.workflow.file_claim(&f.admin, file_request("AAA1")).await.unwrap();
        let pending = pending_claim(&f, "BBB2").await;
        let settled = pending_claim(&f, "CCC3").await;
        f.workflow.reject(&f.master, settled.id, "not covered").await.unwrap();

        let ids = |v: Vec<ClaimListing>| v.into_iter().map(|l| l.claim.id).collect::<Vec<_>>();
        assert_eq!(ids(f.workflow.claim_queue(&f.master, ClaimQueue::Unacknowledged).await.unwrap()), vec![unack.id]);
        assert_eq!(ids(f.workflow.claim_queue(&f.master, ClaimQueue::Pending).await.unwrap()), vec![pending.id]);
        assert_eq!(ids(f.workflow.claim_queue(&f.master, ClaimQueue::History).await.unwrap()), vec![settled.id]);
        assert!(matches!(
            f.workflow.claim_queue(&f.admin, ClaimQueue::Pending).await,
            Err(ClaimError::Forbidden(_))
        ));

        let detail = f.workflow.claim_detail(&f.master, pending.id).await.unwrap();
        assert_eq!(detail.claim.shop_name.as_deref(), Some("ipoh Tyres"));
        assert_eq!(detail.warranty.map(|w| w.car_plate), Some("BBB2".to_string()));

        let result = f.workflow.claim_detail(&f.other_admin, pending.id).await;
        assert!(matches!(result, Err(ClaimError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_tag_warranty_on_unbound_claim() {
        let f = fixture(WorkflowConfig {
            requires_acknowledgment: false,
            bind_warranty_on_create: false,
        })
        .await;
        let first = register(&f, "ABC123", date(2024, 1, 1)).await;
        let claim = f.workflow.file_claim(&f.admin, file_request("ABC123")).await.unwrap();

        let result = f.workflow.tag_warranty(&f.master, claim.id, WarrantyId::new()).await;
        assert!(matches!(result, Err(ClaimError::WarrantyNotFound(_))));

        let tagged = f.workflow.tag_warranty(&f.master, claim.id, first.id).await.unwrap();
        assert_eq!(tagged.warranty_id, Some(first.id));

        let retag = f.workflow.tag_warranty(&f.master, claim.id, first.id).await;
        assert!(matches!(retag, Err(ClaimError::Conflict(_))));

        let other = f.workflow.file_claim(&f.admin, file_request("ABC123")).await;
        assert!(matches!(other, Err(ClaimError::NoValidWarranty { .. })));
    }

    #[tokio::test]
    async fn test_tag_warranty_already_consumed_elsewhere() {
        let f = fixture(WorkflowConfig {
            requires_acknowledgment: false,
            bind_warranty_on_create: false,
        })
        .await;
        let warranty = register(&f, "ABC123", date(2024, 1, 1)).await;
        let a = f.workflow.file_claim(&f.admin, file_request("ABC123")).await.unwrap();
        let b = f.workflow.file_claim(&f.admin, file_request("ABC123")).await.unwrap();

        f.workflow.tag_warranty(&f.master, a.id, warranty.id).await.unwrap();
        let result = f.workflow.tag_warranty(&f.master, b.id, warranty.id).await;
        assert!(matches!(result, Err(ClaimError::Conflict(_))));
        assert_eq!(f.claims.stored(b.id).await.unwrap().warranty_id, None);
    }

    #[tokio::test]
    async fn test_tag_warranty_requires_pending() {
        let f = fixture(WorkflowConfig {
            requires_acknowledgment: true,
            bind_warranty_on_create: false,
        })
        .await;
        let warranty = register(&f, "ABC123", date(2024, 1, 1)).await;
        let claim = f.workflow.file_claim(&f.admin, file_request("ABC123")).await.unwrap();
        let result = f.workflow.tag_warranty(&f.master, claim.id, warranty.id).await;
        assert!(matches!(result, Err(ClaimError::InvalidTransition { .. })));

        let result = f.workflow.tag_warranty(&f.admin, claim.id, warranty.id).await;
        assert!(matches!(result, Err(ClaimError::Forbidden(_))));
    }
}
