//! HTTP surface tests
//!
//! Drive the full router with axum-test on top of the in-memory ports.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;

use domain_claims::{Claim, ClaimStatus, WorkflowConfig, MAX_COST};
use domain_warranty::{LogNotifier, ValidityWindow};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, Ports};
use test_utils::{
    assert_claim_stage, assert_total_cost, front_and_rear_tyres, tyre, CostFixtures, CreateAccountBuilder,
    FileClaimBuilder, MockHarness, PlateFixtures, RegisterWarrantyBuilder, ShopFixtures,
};

struct Api {
    server: TestServer,
    harness: MockHarness,
}

fn api() -> Api {
    api_with(WorkflowConfig::default())
}

fn api_with(workflow: WorkflowConfig) -> Api {
    // tokens are verified against the wall clock, so pin the harness to today
    let harness = MockHarness::with_config_on(workflow, Utc::now().date_naive());
    let ports = Ports {
        warranties: Arc::new(harness.warranty_port.clone()),
        claims: Arc::new(harness.claim_port.clone()),
        shops: Arc::new(harness.shop_port.clone()),
        sessions: Arc::new(harness.session_port.clone()),
        health_checks: Vec::new(),
    };
    let config = ApiConfig {
        jwt_secret: "api-test-secret".to_string(),
        require_acknowledgment: workflow.requires_acknowledgment,
        bind_warranty_on_create: workflow.bind_warranty_on_create,
        ..ApiConfig::default()
    };
    let notifier = Arc::new(LogNotifier::new("warranty@example.com", ValidityWindow::default()));
    let state = AppState::new(config, ports, harness.clock.clone(), notifier).unwrap();

    Api {
        server: TestServer::new(create_router(state)).unwrap(),
        harness,
    }
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn purchase_date() -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(30))
        .unwrap()
}

/// Registration body inside the default validity window
fn registration(plate: &str) -> RegisterWarrantyBuilder {
    RegisterWarrantyBuilder::new()
        .with_purchase_date(purchase_date())
        .with_plate(plate)
        .with_receipt("RCPT-2024-0001")
}

impl Api {
    async fn login(&self, path: &str, username: &str) -> Value {
        let response = self
            .server
            .post(path)
            .json(&json!({ "username": username, "password": ShopFixtures::PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    async fn admin_token(&self, username: &str) -> String {
        self.harness.seed_admin(username).await;
        self.login("/api/admin/login", username).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn master_token(&self, username: &str) -> String {
        self.harness.seed_master(username).await;
        self.login("/api/master/login", username).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn register(&self, plate: &str) -> Value {
        let response = self
            .server
            .post("/api/user/warranty")
            .json(&registration(plate).build())
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    async fn file_claim(&self, token: &str, plate: &str) -> TestResponse {
        self.server
            .post("/api/admin/claim")
            .add_header(AUTHORIZATION, bearer(token))
            .json(&FileClaimBuilder::new().with_plate(plate).build())
            .await
    }

    async fn master_post(&self, token: &str, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(AUTHORIZATION, bearer(token))
            .json(&body)
            .await
    }
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_and_health() {
        let api = api();
        let ping = api.server.get("/api/ping").await;
        ping.assert_status_ok();
        assert_eq!(ping.json::<Value>()["message"], "pong");

        api.server.get("/health").await.assert_status_ok();
        api.server.get("/health/ready").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let api = api();
        let response = api.server.get("/health").await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}

// ============================================================================
// Warranty registration and lookup
// ============================================================================

mod warranty_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_normalises_plate_and_sets_expiry() {
        let api = api();
        let warranty = api.register(PlateFixtures::primary_raw()).await;

        assert_eq!(warranty["car_plate"], PlateFixtures::primary());
        assert_eq!(warranty["is_used"], false);
        assert!(warranty["expiry_date"].as_str().unwrap() > warranty["purchase_date"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_missing_receipt() {
        let api = api();
        let response = api
            .server
            .post("/api/user/warranty")
            .json(&json!({
                "name": "Aisyah",
                "phone_number": "0123",
                "purchase_date": purchase_date(),
                "car_plate": "ABC123",
                "receipt": "  "
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_rejects_plate_longer_than_column() {
        let api = api();
        let response = api
            .server
            .post("/api/user/warranty")
            .json(&registration(&"A".repeat(21)).build())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("car plate"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let api = api();
        let response = api
            .server
            .post("/api/user/warranty")
            .json(&json!({ "name": "Aisyah" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_valid_lookup_and_history() {
        let api = api();
        api.register(PlateFixtures::primary()).await;

        let valid = api.server.get("/api/user/warranties/valid/abc123").await;
        valid.assert_status_ok();
        let body = valid.json::<Value>();
        assert_eq!(body["valid"], true);
        assert_eq!(body["warranty"]["car_plate"], "ABC123");

        let none = api.server.get(&format!("/api/user/warranties/valid/{}", PlateFixtures::unregistered())).await.json::<Value>();
        assert_eq!(none["valid"], false);
        assert!(none["warranty"].is_null());

        let history = api.server.get("/api/user/warranties/car-plate/ABC123").await;
        assert_eq!(history.json::<Vec<Value>>().len(), 1);
    }

    #[tokio::test]
    async fn test_receipt_lookup() {
        let api = api();
        let warranty = api.register(PlateFixtures::primary()).await;
        let id = warranty["id"].as_str().unwrap();

        let receipt = api.server.get(&format!("/api/user/warranty/receipt/{}", id)).await;
        receipt.assert_status_ok();
        assert_eq!(receipt.json::<Value>()["receipt"], "RCPT-2024-0001");

        api.server
            .get(&format!("/api/user/warranty/receipt/{}", uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        api.server
            .get("/api/user/warranty/receipt/not-an-id")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Authentication and role guards
// ============================================================================

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let api = api();
        api.server
            .get("/api/admin/claims")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        api.server
            .get("/api/admin/claims")
            .add_header(AUTHORIZATION, bearer("not.a.jwt"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let api = api();
        let master = api.master_token("hq").await;
        let admin = api.admin_token("ipoh").await;

        api.server
            .get("/api/admin/claims")
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        api.server
            .get("/api/master/account")
            .add_header(AUTHORIZATION, bearer(&admin))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_wrong_tier() {
        let api = api();
        api.harness.seed_admin("ipoh").await;

        api.server
            .post("/api/admin/login")
            .json(&json!({ "username": "ipoh", "password": "wrong-password" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        api.server
            .post("/api/master/login")
            .json(&json!({ "username": "ipoh", "password": ShopFixtures::PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_response_hides_password_hash() {
        let api = api();
        api.harness.seed_admin("ipoh").await;
        let session = api.login("/api/admin/login", "ipoh").await;

        assert!(session["token"].is_string());
        assert!(session["refresh_token"].is_string());
        assert!(session["expires_at"].is_string());
        assert_eq!(session["shop"]["username"], "ipoh");
        assert!(session["shop"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_reuse() {
        let api = api();
        api.harness.seed_admin("ipoh").await;
        let session = api.login("/api/admin/login", "ipoh").await;
        let refresh_token = session["refresh_token"].as_str().unwrap();

        let rotated = api
            .server
            .post("/api/auth/refresh")
            .json(&json!({ "refresh_token": refresh_token }))
            .await;
        rotated.assert_status_ok();
        let rotated = rotated.json::<Value>();
        assert_ne!(rotated["refresh_token"], session["refresh_token"]);

        api.server
            .post("/api/auth/refresh")
            .json(&json!({ "refresh_token": refresh_token }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        api.server
            .get("/api/admin/claims")
            .add_header(AUTHORIZATION, bearer(rotated["token"].as_str().unwrap()))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_logout_revokes_access_and_refresh_tokens() {
        let api = api();
        api.harness.seed_admin("ipoh").await;
        let session = api.login("/api/admin/login", "ipoh").await;
        let token = session["token"].as_str().unwrap();

        let logout = api
            .server
            .post("/api/auth/logout")
            .add_header(AUTHORIZATION, bearer(token))
            .await;
        logout.assert_status_ok();
        assert_eq!(logout.json::<Value>()["revoked_refresh_tokens"], 1);

        api.server
            .get("/api/admin/claims")
            .add_header(AUTHORIZATION, bearer(token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        api.server
            .post("/api/auth/refresh")
            .json(&json!({ "refresh_token": session["refresh_token"] }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Claim lifecycle
// ============================================================================

mod claim_tests {
    use super::*;

    #[tokio::test]
    async fn test_file_claim_consumes_warranty() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        api.register(PlateFixtures::primary()).await;

        let first = api.file_claim(&admin, PlateFixtures::primary_raw()).await;
        first.assert_status(StatusCode::CREATED);
        let claim = first.json::<Claim>();
        assert_claim_stage(&claim, ClaimStatus::Unacknowledged, false);
        assert_eq!(claim.car_plate, PlateFixtures::primary());
        assert!(claim.warranty_id.is_some());

        let second = api.file_claim(&admin, PlateFixtures::primary()).await;
        second.assert_status(StatusCode::NOT_FOUND);

        let valid = api
            .server
            .get(&format!("/api/user/warranties/valid/{}", PlateFixtures::primary()))
            .await
            .json::<Value>();
        assert_eq!(valid["valid"], false);
    }

    #[tokio::test]
    async fn test_accepting_unacknowledged_claim_lists_next_steps() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let claim = api.file_claim(&admin, PlateFixtures::primary()).await.json::<Value>();
        let id = claim["id"].as_str().unwrap();

        let response = api
            .master_post(
                &master,
                &format!("/api/master/claim/{}/accept", id),
                json!({ "tyre_details": [{ "brand": "Michelin", "size": "205/55R16", "cost": "120.50" }] }),
            )
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "invalid_transition");
        assert_eq!(body["details"], json!(["pending"]));
    }

    #[tokio::test]
    async fn test_accept_rejects_cost_beyond_column() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let id = api.file_claim(&admin, PlateFixtures::primary()).await.json::<Claim>().id;
        api.master_post(&master, &format!("/api/master/claim/{}/pending", id), json!({}))
            .await
            .assert_status_ok();

        let response = api
            .master_post(
                &master,
                &format!("/api/master/claim/{}/accept", id),
                json!({ "tyre_details": [tyre("Michelin", "205/55R16", MAX_COST + dec!(0.01))] }),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "validation_error");

        let detail = api
            .server
            .get(&format!("/api/master/claim/{}", id))
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .json::<Value>();
        assert_eq!(detail["claim"]["status"], "pending");
    }

    #[tokio::test]
    async fn test_full_lifecycle_to_closure() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let id = api.file_claim(&admin, PlateFixtures::primary()).await.json::<Value>()["id"]
            .as_str()
            .unwrap()
            .to_string();

        api.master_post(&master, &format!("/api/master/claim/{}/pending", id), json!({}))
            .await
            .assert_status_ok();

        let accepted = api
            .master_post(
                &master,
                &format!("/api/master/claim/{}/accept", id),
                json!({ "tyre_details": front_and_rear_tyres() }),
            )
            .await;
        accepted.assert_status_ok();
        let claim = accepted.json::<Claim>();
        assert_claim_stage(&claim, ClaimStatus::Approved, false);
        assert_total_cost(&claim, CostFixtures::front_and_rear_total());
        assert_eq!(claim.tyre_details.len(), 2);
        assert!(claim.date_settled.is_some());

        let close_path = format!("/api/admin/claim/{}/close", id);
        let closed = api
            .server
            .post(&close_path)
            .add_header(AUTHORIZATION, bearer(&admin))
            .await;
        closed.assert_status_ok();
        assert_claim_stage(&closed.json::<Claim>(), ClaimStatus::Approved, true);

        api.server
            .post(&close_path)
            .add_header(AUTHORIZATION, bearer(&admin))
            .await
            .assert_status(StatusCode::CONFLICT);

        let history = api
            .server
            .get("/api/master/claims")
            .add_query_param("status", "history")
            .add_header(AUTHORIZATION, bearer(&master))
            .await;
        history.assert_status_ok();
        let history = history.json::<Vec<Value>>();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["shop_name"], "ipoh Tyres");
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let id = api.file_claim(&admin, PlateFixtures::primary()).await.json::<Value>()["id"]
            .as_str()
            .unwrap()
            .to_string();
        api.master_post(&master, &format!("/api/master/claim/{}/pending", id), json!({}))
            .await
            .assert_status_ok();

        api.master_post(
            &master,
            &format!("/api/master/claim/{}/reject", id),
            json!({ "rejection_reason": "   " }),
        )
        .await
        .assert_status(StatusCode::BAD_REQUEST);

        let detail = api
            .server
            .get(&format!("/api/master/claim/{}", id))
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .json::<Value>();
        assert_eq!(detail["claim"]["status"], "pending");
        assert!(detail["claim"]["rejection_reason"].is_null());
        assert_eq!(detail["warranty"]["car_plate"], "ABC123");

        let rejected = api
            .master_post(
                &master,
                &format!("/api/master/claim/{}/change-status", id),
                json!({ "status": "rejected", "rejection_reason": "tread below 6mm" }),
            )
            .await;
        rejected.assert_status_ok();
        assert_eq!(rejected.json::<Value>()["rejection_reason"], "tread below 6mm");
    }

    #[tokio::test]
    async fn test_change_status_rejects_unknown_status() {
        let api = api();
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let id = api.file_claim(&admin, PlateFixtures::primary()).await.json::<Value>()["id"]
            .as_str()
            .unwrap()
            .to_string();

        api.master_post(
            &master,
            &format!("/api/master/claim/{}/change-status", id),
            json!({ "status": "archived" }),
        )
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_cannot_close_another_shops_claim() {
        let api = api();
        let owner = api.admin_token("ipoh").await;
        let other = api.admin_token("taiping").await;
        let master = api.master_token("hq").await;
        api.register(PlateFixtures::primary()).await;
        let id = api.file_claim(&owner, PlateFixtures::primary()).await.json::<Value>()["id"]
            .as_str()
            .unwrap()
            .to_string();
        api.master_post(&master, &format!("/api/master/claim/{}/pending", id), json!({}))
            .await
            .assert_status_ok();
        api.master_post(
            &master,
            &format!("/api/master/claim/{}/reject", id),
            json!({ "rejection_reason": "sidewall damage" }),
        )
        .await
        .assert_status_ok();

        api.server
            .post(&format!("/api/admin/claim/{}/close", id))
            .add_header(AUTHORIZATION, bearer(&other))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let own = api
            .server
            .get("/api/admin/claims")
            .add_header(AUTHORIZATION, bearer(&other))
            .await
            .json::<Vec<Value>>();
        assert!(own.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let api = api();
        let master = api.master_token("hq").await;
        api.server
            .get(&format!("/api/master/claim/{}", uuid::Uuid::new_v4()))
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_queue_requires_known_status() {
        let api = api();
        let master = api.master_token("hq").await;

        api.server
            .get("/api/master/claims")
            .add_query_param("status", "closed")
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        api.server
            .get("/api/master/claims")
            .add_query_param("status", "unacknowledged")
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_manual_tagging_when_binding_is_deferred() {
        let api = api_with(WorkflowConfig {
            requires_acknowledgment: false,
            bind_warranty_on_create: false,
        });
        let admin = api.admin_token("ipoh").await;
        let master = api.master_token("hq").await;
        let warranty = api.register(PlateFixtures::primary()).await;

        let claim = api.file_claim(&admin, PlateFixtures::primary()).await;
        claim.assert_status(StatusCode::CREATED);
        let claim = claim.json::<Claim>();
        assert_claim_stage(&claim, ClaimStatus::Pending, false);
        assert!(claim.warranty_id.is_none());
        let id = claim.id;

        let candidates = api
            .server
            .get("/api/master/warranties/valid/ABC123")
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .json::<Vec<Value>>();
        assert_eq!(candidates.len(), 1);

        let tagged = api
            .master_post(
                &master,
                &format!("/api/master/claim/{}/tag-warranty", id),
                json!({ "warranty_id": warranty["id"] }),
            )
            .await;
        tagged.assert_status_ok();
        assert_eq!(tagged.json::<Value>()["warranty_id"], warranty["id"]);

        api.master_post(
            &master,
            &format!("/api/master/claim/{}/tag-warranty", id),
            json!({ "warranty_id": warranty["id"] }),
        )
        .await
        .assert_status(StatusCode::CONFLICT);
    }
}

// ============================================================================
// Account management
// ============================================================================

mod account_tests {
    use super::*;

    fn account(username: &str) -> Value {
        let request = CreateAccountBuilder::new(username)
            .with_shop_name("Taiping Tyre House")
            .build();
        json!({
            "shop_name": request.shop_name,
            "address": request.address,
            "contact": request.contact,
            "username": request.username,
            "password": request.password
        })
    }

    #[tokio::test]
    async fn test_create_and_list_accounts() {
        let api = api();
        let master = api.master_token("hq").await;

        let created = api.master_post(&master, "/api/master/account", account("taiping")).await;
        created.assert_status(StatusCode::CREATED);
        let created = created.json::<Value>();
        assert_eq!(created["role"], "admin");
        assert!(created.get("password_hash").is_none());

        api.master_post(&master, "/api/master/account", account("taiping"))
            .await
            .assert_status(StatusCode::CONFLICT);

        let listed = api
            .server
            .get("/api/master/account")
            .add_header(AUTHORIZATION, bearer(&master))
            .await
            .json::<Vec<Value>>();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["username"], "taiping");

        // the new account can log in on the admin tier
        api.login("/api/admin/login", "taiping").await;
    }

    #[tokio::test]
    async fn test_short_password_is_validation_error() {
        let api = api();
        let master = api.master_token("hq").await;
        let request = CreateAccountBuilder::new("taiping").with_password("short").build();
        let mut body = account("taiping");
        body["password"] = json!(request.password);

        api.master_post(&master, "/api/master/account", body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
