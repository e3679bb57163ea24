//! In-memory service harness
//!
//! Wires every domain service to the mock ports and a pinned clock, the way
//! the server binary wires them to PostgreSQL.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use core_kernel::{FixedClock, ShopId};
use domain_claims::ports::mock::MockClaimPort;
use domain_claims::{ClaimWorkflow, WorkflowConfig};
use domain_shop::password::hash_password;
use domain_shop::ports::mock::{MockSessionPort, MockShopPort};
use domain_shop::{Caller, NewShop, Role, ShopPort, ShopService};
use domain_warranty::ports::mock::MockWarrantyPort;
use domain_warranty::{LogNotifier, ValidityWindow, WarrantyService};

use crate::fixtures::{DateFixtures, ShopFixtures};

pub struct MockHarness {
    pub clock: Arc<FixedClock>,
    pub warranty_port: MockWarrantyPort,
    pub shop_port: MockShopPort,
    pub session_port: MockSessionPort,
    pub claim_port: MockClaimPort,
    pub warranties: WarrantyService,
    pub shops: ShopService,
    pub workflow: ClaimWorkflow,
}

impl MockHarness {
    /// Harness with the default workflow switches, pinned to `DateFixtures::within_window()`
    pub fn new() -> Self {
        Self::with_config(WorkflowConfig::default())
    }

    pub fn with_config(config: WorkflowConfig) -> Self {
        Self::build(config, DateFixtures::within_window())
    }

    pub fn on(today: NaiveDate) -> Self {
        Self::build(WorkflowConfig::default(), today)
    }

    pub fn with_config_on(config: WorkflowConfig, today: NaiveDate) -> Self {
        Self::build(config, today)
    }

    fn build(config: WorkflowConfig, today: NaiveDate) -> Self {
        let clock = Arc::new(FixedClock::on(today));
        let warranty_port = MockWarrantyPort::new();
        let shop_port = MockShopPort::new();
        let session_port = MockSessionPort::new();
        let claim_port = MockClaimPort::new(warranty_port.clone(), shop_port.clone());
        let window = ValidityWindow::default();

        let warranties = WarrantyService::new(
            Arc::new(warranty_port.clone()),
            Arc::new(LogNotifier::new("warranty@example.com", window)),
            clock.clone(),
            window,
        );
        let shops = ShopService::new(Arc::new(shop_port.clone()), clock.clone());
        let workflow = ClaimWorkflow::new(
            Arc::new(claim_port.clone()),
            Arc::new(warranty_port.clone()),
            Arc::new(shop_port.clone()),
            clock.clone(),
            config,
        );

        Self {
            clock,
            warranty_port,
            shop_port,
            session_port,
            claim_port,
            warranties,
            shops,
            workflow,
        }
    }

    /// Stores a shop-level account whose password is `ShopFixtures::PASSWORD`
    pub async fn seed_admin(&self, username: &str) -> Caller {
        self.seed(username, Role::Admin).await
    }

    /// Stores a master account whose password is `ShopFixtures::PASSWORD`
    pub async fn seed_master(&self, username: &str) -> Caller {
        self.seed(username, Role::Master).await
    }

    async fn seed(&self, username: &str, role: Role) -> Caller {
        let password_hash = hash_password(ShopFixtures::PASSWORD).expect("hash fixture password");
        let shop = self
            .shop_port
            .insert(NewShop {
                id: ShopId::new_v7(),
                profile: ShopFixtures::profile(&format!("{} Tyres", username)),
                username: username.to_string(),
                password_hash,
                role,
                created_at: Utc::now(),
            })
            .await
            .expect("seed shop");
        Caller::new(shop.id, shop.username, shop.role)
    }
}

impl Default for MockHarness {
    fn default() -> Self {
        Self::new()
    }
}
