//! Warranty application service

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use core_kernel::{Clock, WarrantyId};
use crate::error::WarrantyError;
use crate::notifier::WarrantyNotifier;
use crate::ports::WarrantyPort;
use crate::warranty::{normalize_plate, RegisterWarranty, ValidityWindow, Warranty};

/// Registration and validity-scoped retrieval of warranties
#[derive(Clone)]
pub struct WarrantyService {
    port: Arc<dyn WarrantyPort>,
    notifier: Arc<dyn WarrantyNotifier>,
    clock: Arc<dyn Clock>,
    window: ValidityWindow,
}

impl WarrantyService {
    pub fn new(
        port: Arc<dyn WarrantyPort>,
        notifier: Arc<dyn WarrantyNotifier>,
        clock: Arc<dyn Clock>,
        window: ValidityWindow,
    ) -> Self {
        Self {
            port,
            notifier,
            clock,
            window,
        }
    }

    pub fn validity_window(&self) -> ValidityWindow {
        self.window
    }

    /// Registers a warranty and schedules the confirmation email
    ///
    /// The email is sent on a detached task; its outcome never affects the
    /// returned warranty.
    #[instrument(skip(self, request), fields(car_plate = %request.car_plate))]
    pub async fn register(&self, request: RegisterWarranty) -> Result<Warranty, WarrantyError> {
        let new = request.prepare(self.window, self.clock.today(), self.clock.now())?;
        let warranty = self
            .port
            .insert(new)
            .await
            .map_err(WarrantyError::storage("register warranty"))?;

        info!(
            warranty_id = %warranty.id,
            expiry_date = %warranty.expiry_date,
            "Warranty registered"
        );
        self.dispatch_confirmation(&warranty);
        Ok(warranty)
    }

    fn dispatch_confirmation(&self, warranty: &Warranty) {
        if warranty.email.is_none() {
            debug!(warranty_id = %warranty.id, "No email on warranty, skipping confirmation");
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(warranty_id = %warranty.id, "No async runtime, confirmation email not sent");
            return;
        };

        let notifier = Arc::clone(&self.notifier);
        let warranty = warranty.clone();
        handle.spawn(async move {
            if let Err(e) = notifier.warranty_registered(&warranty).await {
                warn!(warranty_id = %warranty.id, error = %e, "Warranty confirmation failed");
            }
        });
    }

    /// The warranty a new claim for `car_plate` would consume today, if any
    pub async fn find_valid_by_plate(&self, car_plate: &str) -> Result<Option<Warranty>, WarrantyError> {
        self.port
            .find_valid_by_plate(&normalize_plate(car_plate), self.clock.today())
            .await
            .map_err(WarrantyError::storage("find valid warranty"))
    }

    /// All candidates for manual tagging, latest expiry first
    pub async fn find_all_valid_by_plate(&self, car_plate: &str) -> Result<Vec<Warranty>, WarrantyError> {
        self.port
            .find_all_valid_by_plate(&normalize_plate(car_plate), self.clock.today())
            .await
            .map_err(WarrantyError::storage("find valid warranties"))
    }

    pub async fn list_by_plate(&self, car_plate: &str) -> Result<Vec<Warranty>, WarrantyError> {
        self.port
            .list_by_plate(&normalize_plate(car_plate))
            .await
            .map_err(WarrantyError::storage("list warranties"))
    }

    pub async fn get(&self, id: WarrantyId) -> Result<Warranty, WarrantyError> {
        self.port
            .get(id)
            .await
            .map_err(WarrantyError::storage("get warranty"))?
            .ok_or(WarrantyError::NotFound(id))
    }

    pub async fn get_receipt(&self, id: WarrantyId) -> Result<String, WarrantyError> {
        self.port
            .get_receipt(id)
            .await
            .map_err(WarrantyError::storage("get receipt"))?
            .ok_or(WarrantyError::NotFound(id))
    }
}
