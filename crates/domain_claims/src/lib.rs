//! Claims Domain
//!
//! A claim redeems a warranty. It is filed by a shop and adjudicated by the
//! master tier.
//!
//! # Claim Lifecycle
//!
//! ```text
//! unacknowledged -> pending -> approved | rejected -> closed
//! ```
//!
//! Approval records up to four replacement tyres and their total cost.
//! Closing is a flag set on a settled claim, not a separate status.

pub mod claim;
pub mod settlement;
pub mod ports;
pub mod workflow;
pub mod error;

pub use claim::{Claim, ClaimStatus, TransitionTarget, ClaimQueue, ClaimListing, NewClaim, StatusChange};
pub use settlement::{Settlement, TyreLineItem, TyreDetail, MAX_COST, MAX_TYRES_PER_CLAIM};
pub use ports::ClaimPort;
pub use workflow::{ClaimWorkflow, WorkflowConfig, FileClaim, TransitionRequest, ClaimDetail};
pub use error::ClaimError;
