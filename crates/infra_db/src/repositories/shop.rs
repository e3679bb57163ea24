//! Shop account repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const SHOP_COLUMNS: &str = r#"
    shop_id, shop_name, address, contact, username, password_hash, role, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fails with `DuplicateEntry` when the username is taken
    pub async fn insert(&self, shop: NewShopRecord) -> Result<ShopRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO shops (
                shop_id, shop_name, address, contact, username,
                password_hash, role, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            SHOP_COLUMNS
        );
        let row = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(shop.shop_id)
            .bind(&shop.shop_name)
            .bind(&shop.address)
            .bind(&shop.contact)
            .bind(&shop.username)
            .bind(&shop.password_hash)
            .bind(shop.role)
            .bind(shop.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, shop_id: Uuid) -> Result<Option<ShopRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM shops WHERE shop_id = $1", SHOP_COLUMNS);
        let row = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<ShopRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM shops WHERE username = $1", SHOP_COLUMNS);
        let row = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Accounts holding `role`, newest first
    pub async fn list_by_role(&self, role: ShopRole) -> Result<Vec<ShopRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM shops WHERE role = $1 ORDER BY created_at DESC",
            SHOP_COLUMNS
        );
        let rows = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "shop_role", rename_all = "snake_case")]
pub enum ShopRole {
    Admin,
    Master,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub shop_id: Uuid,
    pub shop_name: String,
    pub address: String,
    pub contact: String,
    pub username: String,
    pub password_hash: String,
    pub role: ShopRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShopRecord {
    pub shop_id: Uuid,
    pub shop_name: String,
    pub address: String,
    pub contact: String,
    pub username: String,
    pub password_hash: String,
    pub role: ShopRole,
    pub created_at: DateTime<Utc>,
}
