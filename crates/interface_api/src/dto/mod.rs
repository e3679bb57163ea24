//! Request/response data transfer objects
//!
//! Domain request types that already match the wire format (`FileClaim`,
//! `CreateAccount`, `TyreLineItem`) are deserialized directly and have no
//! DTO here.

pub mod warranty;
pub mod claims;
pub mod session;
