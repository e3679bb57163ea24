//! Warranty Domain
//!
//! Customers register a warranty when they buy tyres. A warranty is tied to a
//! car plate, expires a configurable window after the purchase date, and can
//! be consumed by exactly one claim.
//!
//! # Validity
//!
//! A warranty is valid for a new claim when both hold:
//! - `expiry_date >= today` (business-local calendar date)
//! - no claim references it yet
//!
//! The second condition is evaluated by the store at query time, never kept
//! as a mutable flag on the warranty row.

pub mod warranty;
pub mod error;
pub mod ports;
pub mod notifier;
pub mod service;

pub use warranty::{Warranty, NewWarranty, RegisterWarranty, ValidityWindow, normalize_plate};
pub use error::WarrantyError;
pub use ports::WarrantyPort;
pub use notifier::{WarrantyNotifier, NotifyError, ConfirmationEmail, LogNotifier};
pub use service::WarrantyService;
