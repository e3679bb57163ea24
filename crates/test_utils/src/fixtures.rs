//! Pre-built Test Fixtures
//!
//! Fixed dates and plates keep scenario tests predictable; customer details
//! come from `fake` where the exact value does not matter.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::CellNumber;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, ShopId, WarrantyId};
use domain_shop::ShopProfile;

/// Calendar fixtures
pub struct DateFixtures;

impl DateFixtures {
    /// Purchase date used by most scenarios
    pub fn purchase() -> NaiveDate {
        Self::ymd(2024, 1, 1)
    }

    /// A day comfortably inside a 6 month window from `purchase()`
    pub fn within_window() -> NaiveDate {
        Self::ymd(2024, 3, 1)
    }

    /// Expiry of `purchase()` under the default window
    pub fn expiry() -> NaiveDate {
        Self::ymd(2024, 7, 1)
    }

    /// The day after `expiry()`
    pub fn after_expiry() -> NaiveDate {
        Self::ymd(2024, 7, 2)
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
    }

    /// Noon UTC on `date`
    pub fn noon(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).expect("valid fixture time"))
    }
}

/// Car plate fixtures, already in canonical form
pub struct PlateFixtures;

impl PlateFixtures {
    pub fn primary() -> &'static str {
        "ABC123"
    }

    pub fn secondary() -> &'static str {
        "WXY9876"
    }

    /// `primary()` as a customer might type it
    pub fn primary_raw() -> &'static str {
        " abc 123 "
    }

    /// A plate that never has a warranty
    pub fn unregistered() -> &'static str {
        "ZZZ0000"
    }
}

/// Generated customer details
pub struct CustomerFixtures;

impl CustomerFixtures {
    pub fn name() -> String {
        Name().fake()
    }

    pub fn phone_number() -> String {
        CellNumber().fake()
    }

    pub fn email() -> String {
        SafeEmail().fake()
    }
}

/// Shop account fixtures
pub struct ShopFixtures;

impl ShopFixtures {
    /// Password that satisfies the account validation rules
    pub const PASSWORD: &'static str = "correct-horse-battery";

    pub fn profile(shop_name: &str) -> ShopProfile {
        ShopProfile {
            shop_name: shop_name.to_string(),
            address: "12 Jalan Raja Ekram, Ipoh".to_string(),
            contact: "05-2419988".to_string(),
        }
    }
}

/// Tyre cost fixtures
pub struct CostFixtures;

impl CostFixtures {
    pub fn front_pair() -> Decimal {
        dec!(100.00)
    }

    pub fn rear_single() -> Decimal {
        dec!(50.00)
    }

    /// `front_pair() + rear_single()`
    pub fn front_and_rear_total() -> Decimal {
        dec!(150.00)
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn claim_id() -> ClaimId {
        ClaimId::new_v7()
    }

    pub fn warranty_id() -> WarrantyId {
        WarrantyId::new_v7()
    }

    pub fn shop_id() -> ShopId {
        ShopId::new_v7()
    }
}
