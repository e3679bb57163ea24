//! Shop Directory and Access Control
//!
//! Shops are the accounts that log in to the backend. Every account has one
//! of two roles:
//!
//! - `admin`: staff of a single shop; may file claims, see and close the
//!   claims of its own shop
//! - `master`: cross-shop administrator; may adjudicate any claim, tag
//!   warranties and manage shop accounts
//!
//! A request is resolved into a [`Caller`] before it reaches a domain
//! service, and each service operation starts with a [`Permission`] check.

pub mod shop;
pub mod access;
pub mod password;
pub mod error;
pub mod ports;
pub mod service;

pub use shop::{Shop, Role, ShopProfile, NewShop, CreateAccount};
pub use access::{Caller, Permission, AccessError};
pub use error::ShopError;
pub use ports::{ShopPort, SessionPort, RefreshTokenRecord};
pub use service::ShopService;
