//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for warranties, claims, shops and sessions, using
//! SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! row types, and adapters implement the domain ports on top of them.
//!
//! # Concurrency
//!
//! - Claim transitions are conditional updates keyed on the expected status.
//! - Approval writes status, tyre details and total in one transaction.
//! - A partial unique index on `claims.warranty_id` makes warranty
//!   consumption race-free.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresWarrantyAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/warranty")).await?;
//! run_migrations(&pool).await?;
//! let warranties = PostgresWarrantyAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::{DatabaseError, db_to_port_error};
pub use adapters::{PostgresWarrantyAdapter, PostgresClaimAdapter, PostgresShopAdapter, PostgresSessionAdapter};
