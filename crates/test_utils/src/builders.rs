//! Test Data Builders
//!
//! Builders for the request types the services accept. Tests set only the
//! fields they care about; everything else gets a valid default.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use domain_claims::{FileClaim, TyreLineItem};
use domain_shop::CreateAccount;
use domain_warranty::RegisterWarranty;

use crate::fixtures::{CostFixtures, CustomerFixtures, DateFixtures, PlateFixtures, ShopFixtures};

/// Builder for warranty registrations
pub struct RegisterWarrantyBuilder {
    name: String,
    phone_number: String,
    email: Option<String>,
    purchase_date: NaiveDate,
    car_plate: String,
    receipt: String,
}

impl Default for RegisterWarrantyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterWarrantyBuilder {
    pub fn new() -> Self {
        Self {
            name: CustomerFixtures::name(),
            phone_number: CustomerFixtures::phone_number(),
            email: Some(CustomerFixtures::email()),
            purchase_date: DateFixtures::purchase(),
            car_plate: PlateFixtures::primary().to_string(),
            receipt: "RCPT-000001".to_string(),
        }
    }

    pub fn with_email(mut self, email: Option<&str>) -> Self {
        self.email = email.map(str::to_string);
        self
    }

    pub fn with_purchase_date(mut self, date: NaiveDate) -> Self {
        self.purchase_date = date;
        self
    }

    pub fn with_plate(mut self, plate: impl Into<String>) -> Self {
        self.car_plate = plate.into();
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = receipt.into();
        self
    }

    pub fn build(self) -> RegisterWarranty {
        RegisterWarranty {
            name: self.name,
            phone_number: self.phone_number,
            email: self.email,
            purchase_date: self.purchase_date,
            car_plate: self.car_plate,
            receipt: self.receipt,
        }
    }
}

/// Builder for claims filed by a shop
pub struct FileClaimBuilder {
    customer_name: String,
    phone_number: String,
    email: Option<String>,
    car_plate: String,
}

impl Default for FileClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileClaimBuilder {
    pub fn new() -> Self {
        Self {
            customer_name: CustomerFixtures::name(),
            phone_number: CustomerFixtures::phone_number(),
            email: None,
            car_plate: PlateFixtures::primary().to_string(),
        }
    }

    pub fn with_plate(mut self, plate: impl Into<String>) -> Self {
        self.car_plate = plate.into();
        self
    }

    pub fn build(self) -> FileClaim {
        FileClaim {
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            email: self.email,
            car_plate: self.car_plate,
        }
    }
}

/// Builder for shop accounts created by the master tier
pub struct CreateAccountBuilder {
    shop_name: String,
    address: String,
    contact: String,
    username: String,
    password: String,
}

impl CreateAccountBuilder {
    pub fn new(username: impl Into<String>) -> Self {
        let profile = ShopFixtures::profile("Ipoh Tyre Centre");
        Self {
            shop_name: profile.shop_name,
            address: profile.address,
            contact: profile.contact,
            username: username.into(),
            password: ShopFixtures::PASSWORD.to_string(),
        }
    }

    pub fn with_shop_name(mut self, name: impl Into<String>) -> Self {
        self.shop_name = name.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn build(self) -> CreateAccount {
        CreateAccount {
            shop_name: self.shop_name,
            address: self.address,
            contact: self.contact,
            username: self.username,
            password: self.password,
        }
    }
}

/// A single replacement tyre
pub fn tyre(brand: &str, size: &str, cost: Decimal) -> TyreLineItem {
    TyreLineItem {
        brand: brand.to_string(),
        size: size.to_string(),
        cost,
    }
}

/// Two tyres totalling `CostFixtures::front_and_rear_total()`
pub fn front_and_rear_tyres() -> Vec<TyreLineItem> {
    vec![
        tyre("Michelin", "205/55R16", CostFixtures::front_pair()),
        tyre("Bridgestone", "205/55R16", CostFixtures::rear_single()),
    ]
}
