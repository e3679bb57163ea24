//! Core Kernel - Foundational types shared by the warranty and claims domains
//!
//! This crate provides the building blocks every other crate depends on:
//! - Strongly-typed identifiers for warranties, claims, shops and tyre line items
//! - The port error type and marker traits for the ports-and-adapters layout
//! - An injectable clock that answers "what is today" in the business time zone

pub mod identifiers;
pub mod ports;
pub mod clock;
pub mod error;
pub mod validation;

pub use identifiers::{WarrantyId, ClaimId, ShopId, TyreDetailId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use clock::{Clock, SystemClock, FixedClock};
pub use error::CoreError;
pub use validation::describe_validation;
