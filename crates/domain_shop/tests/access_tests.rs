//! Access rules across roles and shops

use proptest::prelude::*;

use core_kernel::ShopId;
use domain_shop::{AccessError, Caller, Permission, Role};

fn permission_strategy() -> impl Strategy<Value = Permission> {
    prop_oneof![
        Just(Permission::FileClaim),
        Just(Permission::ViewOwnClaims),
        Just(Permission::CloseClaim),
        Just(Permission::ViewAnyClaim),
        Just(Permission::AdjudicateClaim),
        Just(Permission::TagWarranty),
        Just(Permission::ManageAccounts),
    ]
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Master)]
}

// ============================================================================
// Role table
// ============================================================================

mod role_tests {
    use super::*;

    #[test]
    fn test_only_masters_manage_accounts() {
        assert!(Role::Master.grants(Permission::ManageAccounts));
        assert!(!Role::Admin.grants(Permission::ManageAccounts));
    }

    #[test]
    fn test_both_tiers_may_close() {
        assert!(Role::Admin.grants(Permission::CloseClaim));
        assert!(Role::Master.grants(Permission::CloseClaim));
    }

    #[test]
    fn test_insufficient_role_message_names_the_action() {
        let admin = Caller::new(ShopId::new(), "ipoh", Role::Admin);
        let err = admin.authorize(Permission::TagWarranty).unwrap_err();
        assert_eq!(err.to_string(), "role 'admin' may not tag_warranty");
    }
}

// ============================================================================
// Shop scope
// ============================================================================

mod scope_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_authorize_follows_role_table(role in role_strategy(), permission in permission_strategy()) {
            let caller = Caller::new(ShopId::new(), "someone", role);
            prop_assert_eq!(caller.authorize(permission).is_ok(), role.grants(permission));
        }

        #[test]
        fn prop_own_shop_never_out_of_scope(role in role_strategy(), permission in permission_strategy()) {
            let shop = ShopId::new();
            let caller = Caller::new(shop, "someone", role);
            let own = caller.authorize_for_shop(permission, shop);
            prop_assert_eq!(own.is_ok(), role.grants(permission));
        }

        #[test]
        fn prop_admins_never_reach_other_shops(permission in permission_strategy()) {
            let admin = Caller::new(ShopId::new(), "ipoh", Role::Admin);
            let result = admin.authorize_for_shop(permission, ShopId::new());
            let out_of_scope = matches!(result, Err(AccessError::OutOfScope { .. }));
            let insufficient = matches!(result, Err(AccessError::InsufficientRole { .. }));
            prop_assert!(out_of_scope || insufficient);
        }

        #[test]
        fn prop_masters_are_unscoped(permission in permission_strategy()) {
            let master = Caller::new(ShopId::new(), "hq", Role::Master);
            let result = master.authorize_for_shop(permission, ShopId::new());
            prop_assert_eq!(result.is_ok(), Role::Master.grants(permission));
        }
    }
}
