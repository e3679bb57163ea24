//! HTTP API Layer
//!
//! This crate provides the REST API for the warranty and claims backend
//! using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per surface (customer, shop, master, session)
//! - **Middleware**: Bearer-token guards per role and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent `{error, message, details?}` responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, Ports};
//!
//! let state = AppState::new(config, Ports::postgres(pool), clock, notifier)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod extract;

use axum::{
    extract::Request,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, HealthCheckable};
use domain_claims::{ClaimPort, ClaimWorkflow};
use domain_shop::{SessionPort, ShopPort, ShopService};
use domain_warranty::{WarrantyNotifier, WarrantyPort, WarrantyService};
use infra_db::{
    DatabasePool, PostgresClaimAdapter, PostgresSessionAdapter, PostgresShopAdapter,
    PostgresWarrantyAdapter,
};

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::handlers::{account, claims, health, session, warranty};
use crate::middleware::{audit_middleware, require_admin, require_master, require_session};

/// The storage ports the services run on
pub struct Ports {
    pub warranties: Arc<dyn WarrantyPort>,
    pub claims: Arc<dyn ClaimPort>,
    pub shops: Arc<dyn ShopPort>,
    pub sessions: Arc<dyn SessionPort>,
    /// Checked by `/health/ready`
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl Ports {
    /// PostgreSQL adapters over one pool
    pub fn postgres(pool: DatabasePool) -> Self {
        let warranties = Arc::new(PostgresWarrantyAdapter::new(pool.clone()));
        let claims = Arc::new(PostgresClaimAdapter::new(pool.clone()));
        let shops = Arc::new(PostgresShopAdapter::new(pool.clone()));
        let sessions = Arc::new(PostgresSessionAdapter::new(pool));

        Self {
            health_checks: vec![
                warranties.clone() as Arc<dyn HealthCheckable>,
                claims.clone() as Arc<dyn HealthCheckable>,
                shops.clone() as Arc<dyn HealthCheckable>,
                sessions.clone() as Arc<dyn HealthCheckable>,
            ],
            warranties,
            claims,
            shops,
            sessions,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub tokens: TokenIssuer,
    pub clock: Arc<dyn Clock>,
    pub warranties: WarrantyService,
    pub workflow: ClaimWorkflow,
    pub shops: ShopService,
    pub sessions: Arc<dyn SessionPort>,
    pub health_checks: Arc<[Arc<dyn HealthCheckable>]>,
}

impl AppState {
    /// Wires the domain services onto `ports`
    ///
    /// # Errors
    ///
    /// Fails when the configured validity window cannot be parsed.
    pub fn new(
        config: ApiConfig,
        ports: Ports,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn WarrantyNotifier>,
    ) -> Result<Self, ::config::ConfigError> {
        let window = config.validity_window()?;
        let warranties = WarrantyService::new(ports.warranties.clone(), notifier, clock.clone(), window);
        let workflow = ClaimWorkflow::new(
            ports.claims,
            ports.warranties,
            ports.shops.clone(),
            clock.clone(),
            config.workflow(),
        );
        let shops = ShopService::new(ports.shops, clock.clone());

        Ok(Self {
            tokens: TokenIssuer::from_config(&config),
            config: Arc::new(config),
            clock,
            warranties,
            workflow,
            shops,
            sessions: ports.sessions,
            health_checks: ports.health_checks.into(),
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/ping", get(health::ping))
        .route("/api/user/warranty", post(warranty::register_warranty))
        .route("/api/user/warranties/car-plate/:car_plate", get(warranty::warranties_by_plate))
        .route("/api/user/warranties/valid/:car_plate", get(warranty::valid_warranty))
        .route("/api/user/warranty/receipt/:id", get(warranty::warranty_receipt))
        .route("/api/admin/login", post(session::admin_login))
        .route("/api/master/login", post(session::master_login))
        .route("/api/auth/refresh", post(session::refresh));

    let session_routes = Router::new()
        .route("/api/auth/logout", post(session::logout))
        .route_layer(axum_middleware::from_fn(audit_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_session));

    // Shop-level staff
    let admin_routes = Router::new()
        .route("/api/admin/claim", post(claims::file_claim))
        .route("/api/admin/claims", get(claims::list_shop_claims))
        .route("/api/admin/claim/:id/close", post(claims::close_claim))
        .route_layer(axum_middleware::from_fn(audit_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_admin));

    // Cross-shop administrators
    let master_routes = Router::new()
        .route("/api/master/claims", get(claims::claim_queue))
        .route("/api/master/claim/:id", get(claims::claim_detail))
        .route("/api/master/claim/:id/tag-warranty", post(claims::tag_warranty))
        .route("/api/master/claim/:id/change-status", post(claims::change_status))
        .route("/api/master/claim/:id/pending", post(claims::mark_pending))
        .route("/api/master/claim/:id/accept", post(claims::accept_claim))
        .route("/api/master/claim/:id/reject", post(claims::reject_claim))
        .route(
            "/api/master/account",
            post(account::create_account).get(account::list_accounts),
        )
        .route("/api/master/warranties/valid/:car_plate", get(warranty::tagging_candidates))
        .route_layer(axum_middleware::from_fn(audit_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_master));

    let timeout = state.config.request_timeout();

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .merge(master_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
