//! Warranty store port
//!
//! Consumption is never a flag on the warranty: a warranty counts as used as
//! soon as any claim references it, and the store answers validity queries
//! by joining against claims.

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{DomainPort, PortError, WarrantyId};
use crate::warranty::{NewWarranty, Warranty};

/// Persistence operations for warranties
#[async_trait]
pub trait WarrantyPort: DomainPort {
    /// Persists a freshly registered warranty
    async fn insert(&self, warranty: NewWarranty) -> Result<Warranty, PortError>;

    async fn get(&self, id: WarrantyId) -> Result<Option<Warranty>, PortError>;

    /// The unconsumed warranty for `car_plate` with `expiry_date >= today`
    /// and the latest expiry, or `None`
    async fn find_valid_by_plate(
        &self,
        car_plate: &str,
        today: NaiveDate,
    ) -> Result<Option<Warranty>, PortError>;

    /// Every unconsumed, unexpired warranty for `car_plate`, latest expiry first
    async fn find_all_valid_by_plate(
        &self,
        car_plate: &str,
        today: NaiveDate,
    ) -> Result<Vec<Warranty>, PortError>;

    /// Full history for `car_plate`, newest registration first
    async fn list_by_plate(&self, car_plate: &str) -> Result<Vec<Warranty>, PortError>;

    async fn get_receipt(&self, id: WarrantyId) -> Result<Option<String>, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::ClaimId;

    #[derive(Debug, Default)]
    struct State {
        warranties: HashMap<WarrantyId, Warranty>,
        consumed_by: HashMap<WarrantyId, ClaimId>,
    }

    /// In-memory WarrantyPort
    ///
    /// Claim mocks record consumption through [`MockWarrantyPort::consume`],
    /// which plays the role of the unique index on `claims.warranty_id`.
    #[derive(Debug, Default, Clone)]
    pub struct MockWarrantyPort {
        state: Arc<RwLock<State>>,
        unavailable: Arc<AtomicBool>,
    }

    impl MockWarrantyPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent call fail with a connection error
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock warranty store unavailable"));
            }
            Ok(())
        }

        /// Atomically binds `warranty_id` to `claim_id`
        ///
        /// Fails with `Conflict` if another claim already holds the warranty
        /// and `NotFound` if the warranty does not exist.
        pub async fn consume(
            &self,
            warranty_id: WarrantyId,
            claim_id: ClaimId,
        ) -> Result<(), PortError> {
            self.check_available()?;
            let mut state = self.state.write().await;
            if !state.warranties.contains_key(&warranty_id) {
                return Err(PortError::not_found("Warranty", warranty_id));
            }
            match state.consumed_by.get(&warranty_id) {
                Some(holder) if *holder != claim_id => Err(PortError::conflict(format!(
                    "warranty {} is already consumed by claim {}",
                    warranty_id, holder
                ))),
                _ => {
                    state.consumed_by.insert(warranty_id, claim_id);
                    Ok(())
                }
            }
        }

        pub async fn is_consumed(&self, warranty_id: WarrantyId) -> bool {
            self.state.read().await.consumed_by.contains_key(&warranty_id)
        }

        async fn snapshot_for_plate(&self, car_plate: &str) -> Vec<Warranty> {
            let state = self.state.read().await;
            state
                .warranties
                .values()
                .filter(|w| w.car_plate == car_plate)
                .map(|w| {
                    let mut w = w.clone();
                    w.is_used = state.consumed_by.contains_key(&w.id);
                    w
                })
                .collect()
        }
    }

    impl DomainPort for MockWarrantyPort {}

    #[async_trait]
    impl WarrantyPort for MockWarrantyPort {
        async fn insert(&self, warranty: NewWarranty) -> Result<Warranty, PortError> {
            self.check_available()?;
            let warranty = warranty.into_warranty();
            self.state
                .write()
                .await
                .warranties
                .insert(warranty.id, warranty.clone());
            Ok(warranty)
        }

        async fn get(&self, id: WarrantyId) -> Result<Option<Warranty>, PortError> {
            self.check_available()?;
            let state = self.state.read().await;
            Ok(state.warranties.get(&id).map(|w| {
                let mut w = w.clone();
                w.is_used = state.consumed_by.contains_key(&id);
                w
            }))
        }

        async fn find_valid_by_plate(
            &self,
            car_plate: &str,
            today: NaiveDate,
        ) -> Result<Option<Warranty>, PortError> {
            Ok(self
                .find_all_valid_by_plate(car_plate, today)
                .await?
                .into_iter()
                .next())
        }

        async fn find_all_valid_by_plate(
            &self,
            car_plate: &str,
            today: NaiveDate,
        ) -> Result<Vec<Warranty>, PortError> {
            self.check_available()?;
            let mut valid: Vec<Warranty> = self
                .snapshot_for_plate(car_plate)
                .await
                .into_iter()
                .filter(|w| w.is_valid_for_claims(today))
                .collect();
            valid.sort_by(|a, b| {
                b.expiry_date
                    .cmp(&a.expiry_date)
                    .then(b.created_at.cmp(&a.created_at))
            });
            Ok(valid)
        }

        async fn list_by_plate(&self, car_plate: &str) -> Result<Vec<Warranty>, PortError> {
            self.check_available()?;
            let mut all = self.snapshot_for_plate(car_plate).await;
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(all)
        }

        async fn get_receipt(&self, id: WarrantyId) -> Result<Option<String>, PortError> {
            self.check_available()?;
            Ok(self
                .state
                .read()
                .await
                .warranties
                .get(&id)
                .map(|w| w.receipt.clone()))
        }
    }
}
