//! Request handlers, one module per surface

pub mod health;
pub mod warranty;
pub mod claims;
pub mod account;
pub mod session;
