//! PostgreSQL session adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, ShopId};
use domain_shop::{RefreshTokenRecord, SessionPort};

use crate::error::db_to_port_error;
use crate::repositories::session::SessionRepository;

#[derive(Debug, Clone)]
pub struct PostgresSessionAdapter {
    repository: SessionRepository,
    pool: PgPool,
}

impl PostgresSessionAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: SessionRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresSessionAdapter {}

#[async_trait]
impl HealthCheckable for PostgresSessionAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-session-adapter").await
    }
}

#[async_trait]
impl SessionPort for PostgresSessionAdapter {
    #[instrument(skip(self, record), fields(shop_id = %record.shop_id))]
    async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), PortError> {
        self.repository
            .store_refresh_token(
                &record.token_hash,
                record.shop_id.into(),
                record.expires_at,
                record.created_at,
            )
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, token_hash))]
    async fn consume_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ShopId>, PortError> {
        let shop_id = self
            .repository
            .consume_refresh_token(token_hash, now)
            .await
            .map_err(db_to_port_error)?;
        Ok(shop_id.map(ShopId::from))
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn revoke_refresh_tokens(&self, shop_id: ShopId, now: DateTime<Utc>) -> Result<u64, PortError> {
        self.repository
            .revoke_refresh_tokens(shop_id.into(), now)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn revoke_access_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), PortError> {
        self.repository
            .revoke_access_token(jti, expires_at)
            .await
            .map_err(db_to_port_error)
    }

    async fn is_access_token_revoked(&self, jti: &str) -> Result<bool, PortError> {
        self.repository
            .is_access_token_revoked(jti)
            .await
            .map_err(db_to_port_error)
    }
}
