//! Warranty repository
//!
//! `is_used` is never stored. It is derived from the existence of a claim
//! referencing the warranty, which is what the partial unique index on
//! `claims.warranty_id` protects.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const WARRANTY_COLUMNS: &str = r#"
    w.warranty_id, w.name, w.phone_number, w.email, w.purchase_date,
    w.expiry_date, w.car_plate, w.receipt, w.created_at, w.updated_at,
    EXISTS (SELECT 1 FROM claims c WHERE c.warranty_id = w.warranty_id) AS is_used
"#;

#[derive(Debug, Clone)]
pub struct WarrantyRepository {
    pool: PgPool,
}

impl WarrantyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, warranty: NewWarrantyRecord) -> Result<WarrantyRow, DatabaseError> {
        let row = sqlx::query_as::<_, WarrantyRow>(
            r#"
            INSERT INTO warranties (
                warranty_id, name, phone_number, email, purchase_date,
                expiry_date, car_plate, receipt, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING
                warranty_id, name, phone_number, email, purchase_date,
                expiry_date, car_plate, receipt, created_at, updated_at,
                FALSE AS is_used
            "#,
        )
        .bind(warranty.warranty_id)
        .bind(&warranty.name)
        .bind(&warranty.phone_number)
        .bind(&warranty.email)
        .bind(warranty.purchase_date)
        .bind(warranty.expiry_date)
        .bind(&warranty.car_plate)
        .bind(&warranty.receipt)
        .bind(warranty.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, warranty_id: Uuid) -> Result<Option<WarrantyRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM warranties w WHERE w.warranty_id = $1", WARRANTY_COLUMNS);
        let row = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(warranty_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Unconsumed warranties for `car_plate` expiring on or after `today`,
    /// latest expiry first
    pub async fn find_valid_by_plate(
        &self,
        car_plate: &str,
        today: NaiveDate,
        limit: Option<i64>,
    ) -> Result<Vec<WarrantyRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM warranties w
            WHERE w.car_plate = $1
              AND w.expiry_date >= $2
              AND NOT EXISTS (SELECT 1 FROM claims c WHERE c.warranty_id = w.warranty_id)
            ORDER BY w.expiry_date DESC, w.created_at DESC
            LIMIT $3
            "#,
            WARRANTY_COLUMNS
        );
        let rows = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(car_plate)
            .bind(today)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_plate(&self, car_plate: &str) -> Result<Vec<WarrantyRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM warranties w WHERE w.car_plate = $1 ORDER BY w.created_at DESC",
            WARRANTY_COLUMNS
        );
        let rows = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(car_plate)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_receipt(&self, warranty_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let receipt = sqlx::query_scalar::<_, String>(
            "SELECT receipt FROM warranties WHERE warranty_id = $1",
        )
        .bind(warranty_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(receipt)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WarrantyRow {
    pub warranty_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub car_plate: String,
    pub receipt: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWarrantyRecord {
    pub warranty_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub car_plate: String,
    pub receipt: String,
    pub created_at: DateTime<Utc>,
}
