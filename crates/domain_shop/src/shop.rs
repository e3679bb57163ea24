//! Shop accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::ShopId;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shop-level staff
    Admin,
    /// Cross-shop administrator
    Master,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Master => "master",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "master" => Ok(Role::Master),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Descriptive fields of a shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfile {
    pub shop_name: String,
    pub address: String,
    pub contact: String,
}

/// A shop account
///
/// The password hash never leaves the crate boundary in serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    #[serde(flatten)]
    pub profile: ShopProfile,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated account ready to be persisted
#[derive(Debug, Clone)]
pub struct NewShop {
    pub id: ShopId,
    pub profile: ShopProfile,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewShop {
    pub fn into_shop(self) -> Shop {
        Shop {
            id: self.id,
            profile: self.profile,
            username: self.username,
            password_hash: self.password_hash,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Account creation request from the master tier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccount {
    #[validate(length(min = 1, max = 200, message = "shop name must be 1 to 200 characters"))]
    pub shop_name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "contact may have at most 100 characters"))]
    pub contact: String,
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

impl CreateAccount {
    /// Trims the free-text fields; the password is taken verbatim
    pub fn normalized(self) -> Self {
        Self {
            shop_name: self.shop_name.trim().to_string(),
            address: self.address.trim().to_string(),
            contact: self.contact.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password,
        }
    }
}
