//! Warranty DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use domain_warranty::{RegisterWarranty, Warranty};

#[derive(Debug, Deserialize)]
pub struct RegisterWarrantyRequest {
    pub name: String,
    #[serde(alias = "phone")]
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    pub car_plate: String,
    pub receipt: String,
}

impl From<RegisterWarrantyRequest> for RegisterWarranty {
    fn from(req: RegisterWarrantyRequest) -> Self {
        RegisterWarranty {
            name: req.name,
            phone_number: req.phone_number,
            email: req.email,
            purchase_date: req.purchase_date,
            car_plate: req.car_plate,
            receipt: req.receipt,
        }
    }
}

/// Answer to "does this plate have a claimable warranty today"
#[derive(Debug, Serialize)]
pub struct ValidWarrantyResponse {
    pub valid: bool,
    pub warranty: Option<Warranty>,
}

impl From<Option<Warranty>> for ValidWarrantyResponse {
    fn from(warranty: Option<Warranty>) -> Self {
        Self {
            valid: warranty.is_some(),
            warranty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub receipt: String,
}
