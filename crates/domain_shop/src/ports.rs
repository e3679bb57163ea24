//! Shop directory and session ports

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, PortError, ShopId};
use crate::shop::{NewShop, Role, Shop};

/// Persistence operations for shop accounts
#[async_trait]
pub trait ShopPort: DomainPort {
    /// Persists a new account; a taken username is `PortError::Conflict`
    async fn insert(&self, shop: NewShop) -> Result<Shop, PortError>;

    async fn get(&self, id: ShopId) -> Result<Option<Shop>, PortError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Shop>, PortError>;

    /// Accounts with `role`, newest first
    async fn list_by_role(&self, role: Role) -> Result<Vec<Shop>, PortError>;
}

/// A refresh token as stored: only the SHA-256 hash, never the token itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub shop_id: ShopId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Refresh-token rotation and access-token revocation
#[async_trait]
pub trait SessionPort: DomainPort {
    async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), PortError>;

    /// Marks the token used and returns its owner
    ///
    /// Must be atomic: of two concurrent calls with the same hash at most one
    /// gets `Some`. Unknown, expired and already used tokens give `None`.
    async fn consume_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ShopId>, PortError>;

    /// Revokes every outstanding refresh token of `shop_id`, returning how many
    async fn revoke_refresh_tokens(&self, shop_id: ShopId, now: DateTime<Utc>) -> Result<u64, PortError>;

    /// Denylists an access token id until its natural expiry
    async fn revoke_access_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), PortError>;

    async fn is_access_token_revoked(&self, jti: &str) -> Result<bool, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory ShopPort with a unique username index
    #[derive(Debug, Default, Clone)]
    pub struct MockShopPort {
        shops: Arc<RwLock<HashMap<ShopId, Shop>>>,
    }

    impl MockShopPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.shops.read().await.len()
        }
    }

    impl DomainPort for MockShopPort {}

    #[async_trait]
    impl ShopPort for MockShopPort {
        async fn insert(&self, shop: NewShop) -> Result<Shop, PortError> {
            let mut shops = self.shops.write().await;
            if shops.values().any(|s| s.username == shop.username) {
                return Err(PortError::conflict(format!(
                    "username '{}' already exists",
                    shop.username
                )));
            }
            let shop = shop.into_shop();
            shops.insert(shop.id, shop.clone());
            Ok(shop)
        }

        async fn get(&self, id: ShopId) -> Result<Option<Shop>, PortError> {
            Ok(self.shops.read().await.get(&id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<Shop>, PortError> {
            Ok(self
                .shops
                .read()
                .await
                .values()
                .find(|s| s.username == username)
                .cloned())
        }

        async fn list_by_role(&self, role: Role) -> Result<Vec<Shop>, PortError> {
            let mut shops: Vec<Shop> = self
                .shops
                .read()
                .await
                .values()
                .filter(|s| s.role == role)
                .cloned()
                .collect();
            shops.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(shops)
        }
    }

    #[derive(Debug, Clone)]
    struct StoredRefresh {
        record: RefreshTokenRecord,
        revoked: bool,
    }

    /// In-memory SessionPort
    #[derive(Debug, Default, Clone)]
    pub struct MockSessionPort {
        refresh: Arc<RwLock<HashMap<String, StoredRefresh>>>,
        revoked_access: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    }

    impl MockSessionPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockSessionPort {}

    #[async_trait]
    impl SessionPort for MockSessionPort {
        async fn store_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), PortError> {
            self.refresh.write().await.insert(
                record.token_hash.clone(),
                StoredRefresh {
                    record,
                    revoked: false,
                },
            );
            Ok(())
        }

        async fn consume_refresh_token(
            &self,
            token_hash: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<ShopId>, PortError> {
            let mut refresh = self.refresh.write().await;
            match refresh.get_mut(token_hash) {
                Some(stored) if !stored.revoked && stored.record.expires_at > now => {
                    stored.revoked = true;
                    Ok(Some(stored.record.shop_id))
                }
                _ => Ok(None),
            }
        }

        async fn revoke_refresh_tokens(&self, shop_id: ShopId, _now: DateTime<Utc>) -> Result<u64, PortError> {
            let mut count = 0;
            for stored in self.refresh.write().await.values_mut() {
                if stored.record.shop_id == shop_id && !stored.revoked {
                    stored.revoked = true;
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn revoke_access_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), PortError> {
            self.revoked_access
                .write()
                .await
                .insert(jti.to_string(), expires_at);
            Ok(())
        }

        async fn is_access_token_revoked(&self, jti: &str) -> Result<bool, PortError> {
            Ok(self.revoked_access.read().await.contains_key(jti))
        }
    }
}
