//! Claim store port
//!
//! Every write is conditional on the status the workflow observed. A store
//! that finds the claim in a different state answers `Conflict` and writes
//! nothing, so the precondition is checked at write time rather than
//! read-then-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{ClaimId, DomainPort, PortError, ShopId, WarrantyId};
use crate::claim::{Claim, ClaimListing, ClaimStatus, NewClaim, StatusChange};

/// Persistence operations for claims
#[async_trait]
pub trait ClaimPort: DomainPort {
    /// Persists a new claim
    ///
    /// Fails with `Conflict` when `warranty_id` is already referenced by
    /// another claim; nothing is written in that case.
    async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError>;

    /// Claim with tyre details and the owning shop's name and contact
    async fn get(&self, id: ClaimId) -> Result<Option<ClaimListing>, PortError>;

    /// Claims filed by `shop_id`, newest first
    async fn list_by_shop(&self, shop_id: ShopId) -> Result<Vec<ClaimListing>, PortError>;

    /// Claims currently in any of `statuses`, newest first
    async fn list_by_statuses(&self, statuses: &[ClaimStatus]) -> Result<Vec<ClaimListing>, PortError>;

    /// Writes `change` atomically
    ///
    /// The claim must still be in one of `change.required_status()` (and, for
    /// a close, not yet closed) at write time, otherwise `Conflict`. An
    /// approval persists its status, tyre details, total and settlement date
    /// together or not at all.
    async fn apply_change(&self, id: ClaimId, change: StatusChange) -> Result<Claim, PortError>;

    /// Binds `warranty_id` to a pending claim that has none
    ///
    /// `Conflict` when the claim is no longer pending and unbound, or when
    /// another claim already holds the warranty.
    async fn bind_warranty(
        &self,
        id: ClaimId,
        warranty_id: WarrantyId,
        at: DateTime<Utc>,
    ) -> Result<Claim, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use domain_shop::ports::mock::MockShopPort;
    use domain_shop::ShopPort;
    use domain_warranty::ports::mock::MockWarrantyPort;

    /// In-memory ClaimPort
    ///
    /// Warranty consumption is recorded on the shared [`MockWarrantyPort`],
    /// and shop names are joined from the shared [`MockShopPort`]. Changes are
    /// staged on a copy and only stored once every step succeeded.
    #[derive(Debug, Clone)]
    pub struct MockClaimPort {
        claims: Arc<RwLock<HashMap<ClaimId, Claim>>>,
        warranties: MockWarrantyPort,
        shops: MockShopPort,
        fail_tyre_insert_at: Arc<AtomicUsize>,
        unavailable: Arc<AtomicBool>,
    }

    impl MockClaimPort {
        pub fn new(warranties: MockWarrantyPort, shops: MockShopPort) -> Self {
            Self {
                claims: Arc::new(RwLock::new(HashMap::new())),
                warranties,
                shops,
                fail_tyre_insert_at: Arc::new(AtomicUsize::new(0)),
                unavailable: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Fails the `n`-th (1-based) tyre insert of the next approvals; 0 disables
        pub fn fail_tyre_insert_at(&self, n: usize) {
            self.fail_tyre_insert_at.store(n, Ordering::SeqCst);
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Stored claim without the shop join
        pub async fn stored(&self, id: ClaimId) -> Option<Claim> {
            self.claims.read().await.get(&id).cloned()
        }

        pub async fn len(&self) -> usize {
            self.claims.read().await.len()
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock claim store unavailable"));
            }
            Ok(())
        }

        async fn listing(&self, claim: Claim) -> ClaimListing {
            let shop = self.shops.get(claim.shop_id).await.ok().flatten();
            ClaimListing {
                shop_name: shop.as_ref().map(|s| s.profile.shop_name.clone()),
                shop_contact: shop.map(|s| s.profile.contact),
                claim,
            }
        }

        async fn listings(&self, mut claims: Vec<Claim>) -> Vec<ClaimListing> {
            claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let mut out = Vec::with_capacity(claims.len());
            for claim in claims {
                out.push(self.listing(claim).await);
            }
            out
        }
    }

    impl DomainPort for MockClaimPort {}

    #[async_trait]
    impl ClaimPort for MockClaimPort {
        async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError> {
            self.check_available()?;
            if let Some(warranty_id) = claim.warranty_id {
                self.warranties.consume(warranty_id, claim.id).await?;
            }
            let claim = claim.into_claim();
            self.claims.write().await.insert(claim.id, claim.clone());
            Ok(claim)
        }

        async fn get(&self, id: ClaimId) -> Result<Option<ClaimListing>, PortError> {
            self.check_available()?;
            let claim = self.claims.read().await.get(&id).cloned();
            match claim {
                Some(claim) => Ok(Some(self.listing(claim).await)),
                None => Ok(None),
            }
        }

        async fn list_by_shop(&self, shop_id: ShopId) -> Result<Vec<ClaimListing>, PortError> {
            self.check_available()?;
            let claims = self
                .claims
                .read()
                .await
                .values()
                .filter(|c| c.shop_id == shop_id)
                .cloned()
                .collect();
            Ok(self.listings(claims).await)
        }

        async fn list_by_statuses(&self, statuses: &[ClaimStatus]) -> Result<Vec<ClaimListing>, PortError> {
            self.check_available()?;
            let claims = self
                .claims
                .read()
                .await
                .values()
                .filter(|c| statuses.contains(&c.status))
                .cloned()
                .collect();
            Ok(self.listings(claims).await)
        }

        async fn apply_change(&self, id: ClaimId, change: StatusChange) -> Result<Claim, PortError> {
            self.check_available()?;
            let mut claims = self.claims.write().await;
            let current = claims
                .get(&id)
                .ok_or_else(|| PortError::not_found("Claim", id))?;

            let closing_closed = matches!(change, StatusChange::Close { .. }) && current.is_closed();
            if !change.required_status().contains(&current.status) || closing_closed {
                return Err(PortError::conflict(format!(
                    "claim {} is {} and can no longer move to {}",
                    id,
                    current.stage_label(),
                    change.target()
                )));
            }

            let mut staged = current.clone();
            if let StatusChange::Approve { tyres, .. } = &change {
                let fail_at = self.fail_tyre_insert_at.load(Ordering::SeqCst);
                for position in 1..=tyres.len() {
                    if position == fail_at {
                        return Err(PortError::internal(format!(
                            "injected failure inserting tyre detail {}",
                            position
                        )));
                    }
                }
            }
            staged
                .apply(&change)
                .map_err(|e| PortError::conflict(e.to_string()))?;
            claims.insert(id, staged.clone());
            Ok(staged)
        }

        async fn bind_warranty(
            &self,
            id: ClaimId,
            warranty_id: WarrantyId,
            at: DateTime<Utc>,
        ) -> Result<Claim, PortError> {
            self.check_available()?;
            let mut claims = self.claims.write().await;
            let claim = claims
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Claim", id))?;
            if claim.status != ClaimStatus::Pending || claim.warranty_id.is_some() {
                return Err(PortError::conflict(format!(
                    "claim {} is no longer an unbound pending claim",
                    id
                )));
            }
            self.warranties.consume(warranty_id, id).await?;
            claim.warranty_id = Some(warranty_id);
            claim.updated_at = at;
            Ok(claim.clone())
        }
    }
}
