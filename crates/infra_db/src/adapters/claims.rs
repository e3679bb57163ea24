//! PostgreSQL claim adapter
//!
//! Translates `StatusChange` values into the repository's conditional
//! updates. A lost race comes back as `PortError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError, ShopId, TyreDetailId, WarrantyId};
use domain_claims::{Claim, ClaimListing, ClaimPort, ClaimStatus, NewClaim, StatusChange, TyreDetail};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::claims::{
    ClaimRow, ClaimStatus as DbClaimStatus, ClaimWithTyres, ClaimsRepository, NewClaimRecord, NewTyreDetail,
    TyreDetailRow,
};

#[derive(Debug, Clone)]
pub struct PostgresClaimAdapter {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }

    /// Re-reads the claim so the result carries its tyre details
    async fn reload(&self, row: ClaimRow) -> Result<Claim, PortError> {
        let mut tyres = self
            .repository
            .tyres_for(&[row.claim_id])
            .await
            .map_err(db_to_port_error)?;
        let tyres = tyres.remove(&row.claim_id).unwrap_or_default();
        Ok(row_to_claim(row, tyres))
    }
}

impl DomainPort for PostgresClaimAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-claim-adapter").await
    }
}

#[async_trait]
impl ClaimPort for PostgresClaimAdapter {
    #[instrument(skip(self, claim), fields(claim_id = %claim.id, shop_id = %claim.shop_id))]
    async fn insert(&self, claim: NewClaim) -> Result<Claim, PortError> {
        let record = NewClaimRecord {
            claim_id: claim.id.into(),
            warranty_id: claim.warranty_id.map(Into::into),
            shop_id: claim.shop_id.into(),
            status: domain_to_db_status(claim.status),
            customer_name: claim.customer_name,
            phone_number: claim.phone_number,
            email: claim.email,
            car_plate: claim.car_plate,
            created_at: claim.created_at,
        };
        let row = self.repository.insert(record).await.map_err(db_to_port_error)?;
        Ok(row_to_claim(row, Vec::new()))
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get(&self, id: ClaimId) -> Result<Option<ClaimListing>, PortError> {
        let found = self.repository.get(id.into()).await.map_err(db_to_port_error)?;
        Ok(found.map(to_listing))
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn list_by_shop(&self, shop_id: ShopId) -> Result<Vec<ClaimListing>, PortError> {
        let rows = self
            .repository
            .list_by_shop(shop_id.into())
            .await
            .map_err(db_to_port_error)?;
        debug!(count = rows.len(), "Listed shop claims");
        Ok(rows.into_iter().map(to_listing).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_statuses(&self, statuses: &[ClaimStatus]) -> Result<Vec<ClaimListing>, PortError> {
        let statuses: Vec<DbClaimStatus> = statuses.iter().copied().map(domain_to_db_status).collect();
        let rows = self
            .repository
            .list_by_statuses(&statuses)
            .await
            .map_err(db_to_port_error)?;
        debug!(count = rows.len(), "Listed claims by status");
        Ok(rows.into_iter().map(to_listing).collect())
    }

    #[instrument(skip(self, change), fields(claim_id = %id, to = %change.target()))]
    async fn apply_change(&self, id: ClaimId, change: StatusChange) -> Result<Claim, PortError> {
        let claim_id = id.into();
        let row = match change {
            StatusChange::Acknowledge { at } => self.repository.acknowledge(claim_id, at).await,
            StatusChange::Approve { tyres, total_cost, at } => {
                let tyres: Vec<NewTyreDetail> = tyres
                    .into_iter()
                    .map(|t| NewTyreDetail {
                        tyre_detail_id: t.id.into(),
                        brand: t.brand,
                        size: t.size,
                        cost: t.cost,
                    })
                    .collect();
                self.repository.approve(claim_id, &tyres, total_cost, at).await
            }
            StatusChange::Reject { reason, at } => self.repository.reject(claim_id, &reason, at).await,
            StatusChange::Close { at } => self.repository.close(claim_id, at).await,
        }
        .map_err(|e| claim_error(id, e))?;

        self.reload(row).await
    }

    #[instrument(skip(self, at), fields(claim_id = %id, warranty_id = %warranty_id))]
    async fn bind_warranty(
        &self,
        id: ClaimId,
        warranty_id: WarrantyId,
        at: DateTime<Utc>,
    ) -> Result<Claim, PortError> {
        let row = self
            .repository
            .bind_warranty(id.into(), warranty_id.into(), at)
            .await
            .map_err(|e| match e {
                DatabaseError::ForeignKeyViolation(_) => PortError::not_found("Warranty", warranty_id),
                other => claim_error(id, other),
            })?;
        self.reload(row).await
    }
}

fn claim_error(id: ClaimId, error: DatabaseError) -> PortError {
    match error {
        DatabaseError::NotFound(_) => PortError::not_found("Claim", id),
        other => db_to_port_error(other),
    }
}

fn domain_to_db_status(status: ClaimStatus) -> DbClaimStatus {
    match status {
        ClaimStatus::Unacknowledged => DbClaimStatus::Unacknowledged,
        ClaimStatus::Pending => DbClaimStatus::Pending,
        ClaimStatus::Approved => DbClaimStatus::Approved,
        ClaimStatus::Rejected => DbClaimStatus::Rejected,
    }
}

fn db_to_domain_status(status: DbClaimStatus) -> ClaimStatus {
    match status {
        DbClaimStatus::Unacknowledged => ClaimStatus::Unacknowledged,
        DbClaimStatus::Pending => ClaimStatus::Pending,
        DbClaimStatus::Approved => ClaimStatus::Approved,
        DbClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn row_to_claim(row: ClaimRow, tyres: Vec<TyreDetailRow>) -> Claim {
    Claim {
        id: ClaimId::from(row.claim_id),
        warranty_id: row.warranty_id.map(WarrantyId::from),
        shop_id: ShopId::from(row.shop_id),
        status: db_to_domain_status(row.status),
        rejection_reason: row.rejection_reason,
        date_settled: row.date_settled,
        date_closed: row.date_closed,
        customer_name: row.customer_name,
        phone_number: row.phone_number,
        email: row.email,
        car_plate: row.car_plate,
        total_cost: row.total_cost,
        tyre_details: tyres.into_iter().map(row_to_tyre).collect(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_tyre(row: TyreDetailRow) -> TyreDetail {
    TyreDetail {
        id: TyreDetailId::from(row.tyre_detail_id),
        claim_id: ClaimId::from(row.claim_id),
        brand: row.brand,
        size: row.size,
        cost: row.cost,
        created_at: row.created_at,
    }
}

fn to_listing(found: ClaimWithTyres) -> ClaimListing {
    ClaimListing {
        claim: row_to_claim(found.listing.claim, found.tyres),
        shop_name: found.listing.shop_name,
        shop_contact: found.listing.shop_contact,
    }
}
