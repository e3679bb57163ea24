//! Role-based access control
//!
//! `Caller` is the resolved identity behind a bearer token. Domain services
//! check a `Permission` before touching any state, so the same rules hold no
//! matter which surface invoked them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::ShopId;
use crate::shop::Role;

/// Operations guarded by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Open a claim on behalf of the caller's shop
    FileClaim,
    /// List the claims of the caller's shop
    ViewOwnClaims,
    /// Close a settled claim
    CloseClaim,
    /// Read any claim regardless of shop
    ViewAnyClaim,
    /// Acknowledge, approve or reject a claim
    AdjudicateClaim,
    /// Bind a warranty to a claim by hand
    TagWarranty,
    /// Create and list shop accounts
    ManageAccounts,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FileClaim => "file_claim",
            Permission::ViewOwnClaims => "view_own_claims",
            Permission::CloseClaim => "close_claim",
            Permission::ViewAnyClaim => "view_any_claim",
            Permission::AdjudicateClaim => "adjudicate_claim",
            Permission::TagWarranty => "tag_warranty",
            Permission::ManageAccounts => "manage_accounts",
        }
    }
}

impl Role {
    /// Permission table
    pub fn grants(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => matches!(
                permission,
                Permission::FileClaim | Permission::ViewOwnClaims | Permission::CloseClaim
            ),
            Role::Master => matches!(
                permission,
                Permission::CloseClaim
                    | Permission::ViewAnyClaim
                    | Permission::AdjudicateClaim
                    | Permission::TagWarranty
                    | Permission::ManageAccounts
            ),
        }
    }

    /// Admins only ever act on their own shop's records
    pub fn is_shop_scoped(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("role '{role}' may not {action}", action = .permission.as_str())]
    InsufficientRole { role: Role, permission: Permission },

    #[error("shop {caller_shop} may not access records of shop {owner}")]
    OutOfScope { caller_shop: ShopId, owner: ShopId },
}

/// Authenticated identity of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub shop_id: ShopId,
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(shop_id: ShopId, username: impl Into<String>, role: Role) -> Self {
        Self {
            shop_id,
            username: username.into(),
            role,
        }
    }

    pub fn authorize(&self, permission: Permission) -> Result<(), AccessError> {
        if self.role.grants(permission) {
            Ok(())
        } else {
            Err(AccessError::InsufficientRole {
                role: self.role,
                permission,
            })
        }
    }

    /// Checks the permission and, for shop-scoped roles, ownership of the record
    pub fn authorize_for_shop(&self, permission: Permission, owner: ShopId) -> Result<(), AccessError> {
        self.authorize(permission)?;
        if self.role.is_shop_scoped() && owner != self.shop_id {
            return Err(AccessError::OutOfScope {
                caller_shop: self.shop_id,
                owner,
            });
        }
        Ok(())
    }
}
