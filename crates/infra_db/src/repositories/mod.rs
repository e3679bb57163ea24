//! Repository implementations for domain entities
//!
//! Repositories own the SQL and speak in row types. Queries are built at
//! runtime with `sqlx::query_as` and `FromRow`, so compiling the crate never
//! needs a live database.

pub mod warranty;
pub mod claims;
pub mod shop;
pub mod session;

pub use warranty::WarrantyRepository;
pub use claims::ClaimsRepository;
pub use shop::ShopRepository;
pub use session::SessionRepository;
