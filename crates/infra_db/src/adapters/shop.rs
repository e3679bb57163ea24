//! PostgreSQL shop adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, ShopId};
use domain_shop::{NewShop, Role, Shop, ShopPort, ShopProfile};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::shop::{NewShopRecord, ShopRepository, ShopRole, ShopRow};

#[derive(Debug, Clone)]
pub struct PostgresShopAdapter {
    repository: ShopRepository,
    pool: PgPool,
}

impl PostgresShopAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ShopRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresShopAdapter {}

#[async_trait]
impl HealthCheckable for PostgresShopAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-shop-adapter").await
    }
}

#[async_trait]
impl ShopPort for PostgresShopAdapter {
    #[instrument(skip(self, shop), fields(username = %shop.username))]
    async fn insert(&self, shop: NewShop) -> Result<Shop, PortError> {
        let username = shop.username.clone();
        let record = NewShopRecord {
            shop_id: shop.id.into(),
            shop_name: shop.profile.shop_name,
            address: shop.profile.address,
            contact: shop.profile.contact,
            username: shop.username,
            password_hash: shop.password_hash,
            role: domain_to_db_role(shop.role),
            created_at: shop.created_at,
        };
        let row = self.repository.insert(record).await.map_err(|e| match e {
            DatabaseError::DuplicateEntry(_) => {
                PortError::conflict(format!("username '{}' is already registered", username))
            }
            other => db_to_port_error(other),
        })?;
        Ok(row_to_shop(row))
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn get(&self, id: ShopId) -> Result<Option<Shop>, PortError> {
        let row = self.repository.get_by_id(id.into()).await.map_err(db_to_port_error)?;
        Ok(row.map(row_to_shop))
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<Shop>, PortError> {
        let row = self
            .repository
            .find_by_username(username)
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(row_to_shop))
    }

    #[instrument(skip(self))]
    async fn list_by_role(&self, role: Role) -> Result<Vec<Shop>, PortError> {
        let rows = self
            .repository
            .list_by_role(domain_to_db_role(role))
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_shop).collect())
    }
}

fn domain_to_db_role(role: Role) -> ShopRole {
    match role {
        Role::Admin => ShopRole::Admin,
        Role::Master => ShopRole::Master,
    }
}

fn row_to_shop(row: ShopRow) -> Shop {
    Shop {
        id: ShopId::from(row.shop_id),
        profile: ShopProfile {
            shop_name: row.shop_name,
            address: row.address,
            contact: row.contact,
        },
        username: row.username,
        password_hash: row.password_hash,
        role: match row.role {
            ShopRole::Admin => Role::Admin,
            ShopRole::Master => Role::Master,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
