//! PostgreSQL warranty adapter

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, WarrantyId};
use domain_warranty::{NewWarranty, Warranty, WarrantyPort};

use crate::error::db_to_port_error;
use crate::repositories::warranty::{NewWarrantyRecord, WarrantyRepository, WarrantyRow};

#[derive(Debug, Clone)]
pub struct PostgresWarrantyAdapter {
    repository: WarrantyRepository,
    pool: PgPool,
}

impl PostgresWarrantyAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: WarrantyRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &WarrantyRepository {
        &self.repository
    }
}

impl DomainPort for PostgresWarrantyAdapter {}

#[async_trait]
impl HealthCheckable for PostgresWarrantyAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-warranty-adapter").await
    }
}

#[async_trait]
impl WarrantyPort for PostgresWarrantyAdapter {
    #[instrument(skip(self, warranty), fields(warranty_id = %warranty.id))]
    async fn insert(&self, warranty: NewWarranty) -> Result<Warranty, PortError> {
        let record = NewWarrantyRecord {
            warranty_id: warranty.id.into(),
            name: warranty.name,
            phone_number: warranty.phone_number,
            email: warranty.email,
            purchase_date: warranty.purchase_date,
            expiry_date: warranty.expiry_date,
            car_plate: warranty.car_plate,
            receipt: warranty.receipt,
            created_at: warranty.created_at,
        };
        let row = self.repository.insert(record).await.map_err(db_to_port_error)?;
        Ok(row_to_warranty(row))
    }

    #[instrument(skip(self), fields(warranty_id = %id))]
    async fn get(&self, id: WarrantyId) -> Result<Option<Warranty>, PortError> {
        let row = self
            .repository
            .get_by_id(id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(row_to_warranty))
    }

    #[instrument(skip(self))]
    async fn find_valid_by_plate(
        &self,
        car_plate: &str,
        today: NaiveDate,
    ) -> Result<Option<Warranty>, PortError> {
        let rows = self
            .repository
            .find_valid_by_plate(car_plate, today, Some(1))
            .await
            .map_err(db_to_port_error)?;
        debug!(found = !rows.is_empty(), "Valid warranty lookup");
        Ok(rows.into_iter().next().map(row_to_warranty))
    }

    #[instrument(skip(self))]
    async fn find_all_valid_by_plate(
        &self,
        car_plate: &str,
        today: NaiveDate,
    ) -> Result<Vec<Warranty>, PortError> {
        let rows = self
            .repository
            .find_valid_by_plate(car_plate, today, None)
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_warranty).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_plate(&self, car_plate: &str) -> Result<Vec<Warranty>, PortError> {
        let rows = self
            .repository
            .list_by_plate(car_plate)
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_warranty).collect())
    }

    #[instrument(skip(self), fields(warranty_id = %id))]
    async fn get_receipt(&self, id: WarrantyId) -> Result<Option<String>, PortError> {
        self.repository
            .get_receipt(id.into())
            .await
            .map_err(db_to_port_error)
    }
}

fn row_to_warranty(row: WarrantyRow) -> Warranty {
    Warranty {
        id: WarrantyId::from(row.warranty_id),
        name: row.name,
        phone_number: row.phone_number,
        email: row.email,
        purchase_date: row.purchase_date,
        expiry_date: row.expiry_date,
        car_plate: row.car_plate,
        receipt: row.receipt,
        is_used: row.is_used,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
