//! Warranty API Server Binary
//!
//! Starts the HTTP API server for the warranty and claims backend.
//!
//! # Usage
//!
//! ```bash
//! API_DATABASE_URL=postgres://... API_JWT_SECRET=... cargo run --bin warranty-api
//!
//! # Load .env.staging before .env
//! APP_ENV=staging cargo run --bin warranty-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string (required)
//! * `API_JWT_SECRET` - Access-token signing secret (required)
//! * `API_ADMIN_TOKEN_TTL_SECS` / `API_MASTER_TOKEN_TTL_SECS` / `API_REFRESH_TOKEN_TTL_SECS`
//! * `API_WARRANTY_VALIDITY` - `6m`, `15d`, ... (default: 6m)
//! * `API_REQUIRE_ACKNOWLEDGMENT` / `API_BIND_WARRANTY_ON_CREATE` - workflow switches
//! * `API_BUSINESS_TIMEZONE` - Zone that defines "today" (default: Asia/Kuala_Lumpur)
//! * `API_BOOTSTRAP_MASTER_USERNAME` / `API_BOOTSTRAP_MASTER_PASSWORD` - first master account
//! * `API_LOG_LEVEL` / `API_LOG_FORMAT` - `info` / `pretty` or `json`

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_shop::ShopProfile;
use domain_warranty::LogNotifier;
use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::{create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_files();

    let config = ApiConfig::from_env().context("Failed to load configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        validity = %config.warranty_validity,
        timezone = %config.business_timezone,
        "Starting warranty API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;

    let clock = Arc::new(config.clock()?);
    let notifier = Arc::new(LogNotifier::new(
        config.notify_from.clone(),
        config.validity_window()?,
    ));
    let state = AppState::new(config.clone(), Ports::postgres(pool), clock, notifier)?;

    bootstrap_master(&state, &config).await?;

    let app = create_router(state);
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads `.env.{APP_ENV}` when `APP_ENV` is set, then `.env`
///
/// Variables already present in the environment are never overridden.
fn load_env_files() {
    if let Ok(app_env) = std::env::var("APP_ENV") {
        dotenvy::from_filename(format!(".env.{}", app_env)).ok();
    }
    dotenvy::dotenv().ok();
}

/// Initializes the tracing subscriber
///
/// `RUST_LOG` takes precedence over `API_LOG_LEVEL`.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Creates the configured master account when no master exists yet
async fn bootstrap_master(state: &AppState, config: &ApiConfig) -> anyhow::Result<()> {
    let Some((username, password)) = config.bootstrap_master() else {
        return Ok(());
    };

    let profile = ShopProfile {
        shop_name: "Head Office".to_string(),
        address: "-".to_string(),
        contact: String::new(),
    };
    match state
        .shops
        .ensure_master_account(username, password, profile)
        .await
        .context("Failed to bootstrap the master account")?
    {
        Some(shop) => tracing::info!(username = %shop.username, "Bootstrap master account created"),
        None => tracing::debug!("Master account already present; bootstrap skipped"),
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
