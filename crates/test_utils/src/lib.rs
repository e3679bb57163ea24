//! Test Utilities Crate
//!
//! Shared test infrastructure for the warranty and claims test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, plates and generated customer data
//! - `builders`: Builders for registration, claim and account requests
//! - `harness`: Domain services wired to the in-memory ports
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Assertion helpers for claims

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;

pub use fixtures::*;
pub use builders::*;
pub use harness::MockHarness;
pub use assertions::*;
