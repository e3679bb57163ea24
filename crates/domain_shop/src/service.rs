//! Shop directory service

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{describe_validation, Clock, ShopId};
use crate::access::{Caller, Permission};
use crate::error::ShopError;
use crate::password::{hash_password_blocking, verify_password_blocking, verify_unknown_account_blocking};
use crate::ports::ShopPort;
use crate::shop::{CreateAccount, NewShop, Role, Shop, ShopProfile};

#[derive(Clone)]
pub struct ShopService {
    port: Arc<dyn ShopPort>,
    clock: Arc<dyn Clock>,
}

impl ShopService {
    pub fn new(port: Arc<dyn ShopPort>, clock: Arc<dyn Clock>) -> Self {
        Self { port, clock }
    }

    /// Creates a shop-level (`admin`) account on behalf of a master caller
    #[instrument(skip(self, caller, request), fields(caller = %caller.username, username = %request.username))]
    pub async fn create_account(&self, caller: &Caller, request: CreateAccount) -> Result<Shop, ShopError> {
        caller.authorize(Permission::ManageAccounts)?;
        let shop = self.register(request, Role::Admin).await?;
        info!(shop_id = %shop.id, "Shop account created");
        Ok(shop)
    }

    /// Admin accounts, newest first
    pub async fn list_accounts(&self, caller: &Caller) -> Result<Vec<Shop>, ShopError> {
        caller.authorize(Permission::ManageAccounts)?;
        self.port
            .list_by_role(Role::Admin)
            .await
            .map_err(ShopError::storage("list shop accounts"))
    }

    pub async fn get(&self, id: ShopId) -> Result<Shop, ShopError> {
        self.port
            .get(id)
            .await
            .map_err(ShopError::storage("get shop"))?
            .ok_or_else(|| ShopError::NotFound(id.to_string()))
    }

    /// Verifies a login for an account that must hold `role`
    ///
    /// Unknown usernames, wrong passwords and role mismatches all surface as
    /// `InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str, role: Role) -> Result<Shop, ShopError> {
        let found = self
            .port
            .find_by_username(username.trim())
            .await
            .map_err(ShopError::storage("find shop by username"))?;
        let Some(shop) = found else {
            verify_unknown_account_blocking(password.to_string()).await?;
            warn!("Login for unknown username");
            return Err(ShopError::InvalidCredentials);
        };

        let verified = verify_password_blocking(password.to_string(), shop.password_hash.clone()).await?;
        if !verified {
            warn!("Password mismatch");
            return Err(ShopError::InvalidCredentials);
        }
        if shop.role != role {
            warn!(actual = %shop.role, "Login attempted with the wrong role");
            return Err(ShopError::InvalidCredentials);
        }
        Ok(shop)
    }

    /// Creates the first master account when none exists yet
    ///
    /// Returns `None` when a master account is already present.
    pub async fn ensure_master_account(
        &self,
        username: &str,
        password: &str,
        profile: ShopProfile,
    ) -> Result<Option<Shop>, ShopError> {
        let masters = self
            .port
            .list_by_role(Role::Master)
            .await
            .map_err(ShopError::storage("list master accounts"))?;
        if !masters.is_empty() {
            return Ok(None);
        }

        let request = CreateAccount {
            shop_name: profile.shop_name,
            address: profile.address,
            contact: profile.contact,
            username: username.to_string(),
            password: password.to_string(),
        };
        let shop = self.register(request, Role::Master).await?;
        info!(shop_id = %shop.id, username = %shop.username, "Bootstrap master account created");
        Ok(Some(shop))
    }

    async fn register(&self, request: CreateAccount, role: Role) -> Result<Shop, ShopError> {
        let request = request.normalized();
        request
            .validate()
            .map_err(|e| ShopError::Validation(describe_validation(&e)))?;

        let password_hash = hash_password_blocking(request.password).await?;
        let new = NewShop {
            id: ShopId::new_v7(),
            profile: ShopProfile {
                shop_name: request.shop_name,
                address: request.address,
                contact: request.contact,
            },
            username: request.username.clone(),
            password_hash,
            role,
            created_at: self.clock.now(),
        };

        self.port.insert(new).await.map_err(|e| {
            if e.is_conflict() {
                ShopError::UsernameTaken(request.username)
            } else {
                ShopError::storage("create shop account")(e)
            }
        })
    }
}
