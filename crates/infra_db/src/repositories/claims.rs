//! Claims repository
//!
//! Status changes are conditional updates keyed on the status the caller
//! expects. An update that matches no row is reported as `StaleState` (or
//! `NotFound` when the claim does not exist at all); it never overwrites a
//! concurrent change.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    c.claim_id, c.warranty_id, c.shop_id, c.status, c.rejection_reason,
    c.date_settled, c.date_closed, c.customer_name, c.phone_number, c.email,
    c.car_plate, c.total_cost, c.created_at, c.updated_at
"#;

const LISTING_FROM: &str = r#"
    , s.shop_name, s.contact AS shop_contact
    FROM claims c
    LEFT JOIN shops s ON s.shop_id = c.shop_id
"#;

/// Repository for claims and their tyre details
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a claim; a second claim on the same warranty violates
    /// `uq_claims_warranty` and surfaces as `DuplicateEntry`
    pub async fn insert(&self, claim: NewClaimRecord) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO claims AS c (
                claim_id, warranty_id, shop_id, status, customer_name,
                phone_number, email, car_plate, total_cost, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $9)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim.claim_id)
            .bind(claim.warranty_id)
            .bind(claim.shop_id)
            .bind(claim.status)
            .bind(&claim.customer_name)
            .bind(&claim.phone_number)
            .bind(&claim.email)
            .bind(&claim.car_plate)
            .bind(claim.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, claim_id: Uuid) -> Result<Option<ClaimWithTyres>, DatabaseError> {
        let sql = format!("SELECT {} {} WHERE c.claim_id = $1", CLAIM_COLUMNS, LISTING_FROM);
        let listing = sqlx::query_as::<_, ClaimListingRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?;

        match listing {
            Some(listing) => {
                let mut tyres = self.tyres_for(&[claim_id]).await?;
                Ok(Some(ClaimWithTyres {
                    tyres: tyres.remove(&claim_id).unwrap_or_default(),
                    listing,
                }))
            }
            None => Ok(None),
        }
    }

    /// Claims of one shop, newest first
    pub async fn list_by_shop(&self, shop_id: Uuid) -> Result<Vec<ClaimWithTyres>, DatabaseError> {
        let sql = format!(
            "SELECT {} {} WHERE c.shop_id = $1 ORDER BY c.created_at DESC",
            CLAIM_COLUMNS, LISTING_FROM
        );
        let rows = sqlx::query_as::<_, ClaimListingRow>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_tyres(rows).await
    }

    /// Claims in any of `statuses`, newest first
    pub async fn list_by_statuses(&self, statuses: &[ClaimStatus]) -> Result<Vec<ClaimWithTyres>, DatabaseError> {
        let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "SELECT {} {} WHERE c.status::text = ANY($1) ORDER BY c.created_at DESC",
            CLAIM_COLUMNS, LISTING_FROM
        );
        let rows = sqlx::query_as::<_, ClaimListingRow>(&sql)
            .bind(names)
            .fetch_all(&self.pool)
            .await?;
        self.attach_tyres(rows).await
    }

    /// unacknowledged -> pending
    pub async fn acknowledge(&self, claim_id: Uuid, at: DateTime<Utc>) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE claims AS c
            SET status = 'pending', updated_at = $2
            WHERE c.claim_id = $1 AND c.status = 'unacknowledged'
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row),
            None => Err(self.missing_or_stale(claim_id, "unacknowledged").await),
        }
    }

    /// pending -> approved, with the tyre details, in one transaction
    ///
    /// The conditional update runs first and holds the row lock until commit,
    /// so a concurrent approval or rejection waits and then matches no row.
    /// Any failing tyre insert rolls back the status change with it.
    pub async fn approve(
        &self,
        claim_id: Uuid,
        tyres: &[NewTyreDetail],
        total_cost: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ClaimRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE claims AS c
            SET status = 'approved', total_cost = $2, date_settled = $3, updated_at = $3
            WHERE c.claim_id = $1 AND c.status = 'pending'
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let claim = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(total_cost)
            .bind(at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(claim) = claim else {
            tx.rollback().await?;
            return Err(self.missing_or_stale(claim_id, "pending").await);
        };

        for tyre in tyres {
            sqlx::query(
                r#"
                INSERT INTO tyre_details (tyre_detail_id, claim_id, brand, size, cost, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(tyre.tyre_detail_id)
            .bind(claim_id)
            .bind(&tyre.brand)
            .bind(&tyre.size)
            .bind(tyre.cost)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(claim)
    }

    /// pending -> rejected
    pub async fn reject(&self, claim_id: Uuid, reason: &str, at: DateTime<Utc>) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE claims AS c
            SET status = 'rejected', rejection_reason = $2, date_settled = $3, updated_at = $3
            WHERE c.claim_id = $1 AND c.status = 'pending'
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(reason)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row),
            None => Err(self.missing_or_stale(claim_id, "pending").await),
        }
    }

    /// Sets `date_closed` on a settled claim that is not closed yet
    pub async fn close(&self, claim_id: Uuid, at: DateTime<Utc>) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE claims AS c
            SET date_closed = $2, updated_at = $2
            WHERE c.claim_id = $1
              AND c.status IN ('approved', 'rejected')
              AND c.date_closed IS NULL
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row),
            None => Err(self.missing_or_stale(claim_id, "an open settled claim").await),
        }
    }

    /// Binds a warranty to a pending claim without one
    ///
    /// The partial unique index turns a concurrent bind of the same warranty
    /// into `DuplicateEntry`; an unknown warranty is a `ForeignKeyViolation`.
    pub async fn bind_warranty(
        &self,
        claim_id: Uuid,
        warranty_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE claims AS c
            SET warranty_id = $2, updated_at = $3
            WHERE c.claim_id = $1 AND c.status = 'pending' AND c.warranty_id IS NULL
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(warranty_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row),
            None => Err(self.missing_or_stale(claim_id, "an unbound pending claim").await),
        }
    }

    pub async fn tyres_for(&self, claim_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<TyreDetailRow>>, DatabaseError> {
        if claim_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, TyreDetailRow>(
            r#"
            SELECT tyre_detail_id, claim_id, brand, size, cost, created_at
            FROM tyre_details
            WHERE claim_id = ANY($1)
            ORDER BY created_at, tyre_detail_id
            "#,
        )
        .bind(claim_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<TyreDetailRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.claim_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn attach_tyres(&self, rows: Vec<ClaimListingRow>) -> Result<Vec<ClaimWithTyres>, DatabaseError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.claim.claim_id).collect();
        let mut tyres = self.tyres_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|listing| ClaimWithTyres {
                tyres: tyres.remove(&listing.claim.claim_id).unwrap_or_default(),
                listing,
            })
            .collect())
    }

    async fn missing_or_stale(&self, claim_id: Uuid, expected: &str) -> DatabaseError {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM claims WHERE claim_id = $1)")
            .bind(claim_id)
            .fetch_one(&self.pool)
            .await;
        match exists {
            Ok(true) => DatabaseError::stale("Claim", claim_id, expected),
            Ok(false) => DatabaseError::not_found("Claim", claim_id),
            Err(e) => e.into(),
        }
    }
}

/// Claim status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Unacknowledged,
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Unacknowledged => "unacknowledged",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub warranty_id: Option<Uuid>,
    pub shop_id: Uuid,
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
    pub date_settled: Option<DateTime<Utc>>,
    pub date_closed: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub car_plate: String,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimListingRow {
    #[sqlx(flatten)]
    pub claim: ClaimRow,
    pub shop_name: Option<String>,
    pub shop_contact: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TyreDetailRow {
    pub tyre_detail_id: Uuid,
    pub claim_id: Uuid,
    pub brand: String,
    pub size: String,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClaimWithTyres {
    pub listing: ClaimListingRow,
    pub tyres: Vec<TyreDetailRow>,
}

#[derive(Debug, Clone)]
pub struct NewClaimRecord {
    pub claim_id: Uuid,
    pub warranty_id: Option<Uuid>,
    pub shop_id: Uuid,
    pub status: ClaimStatus,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub car_plate: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTyreDetail {
    pub tyre_detail_id: Uuid,
    pub brand: String,
    pub size: String,
    pub cost: Decimal,
}
