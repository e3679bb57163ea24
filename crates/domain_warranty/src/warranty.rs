//! Warranty aggregate and the validity window rule

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{describe_validation, WarrantyId};
use crate::error::WarrantyError;

/// A registered tyre warranty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warranty {
    pub id: WarrantyId,
    /// Customer name
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    /// `purchase_date` plus the validity window in force at registration
    pub expiry_date: NaiveDate,
    /// Normalised car plate, the natural lookup key
    pub car_plate: String,
    /// Receipt reference supplied by the customer
    pub receipt: String,
    /// Whether a claim references this warranty, derived by the store
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warranty {
    /// Returns true when a new claim may still consume this warranty on `today`
    pub fn is_valid_for_claims(&self, today: NaiveDate) -> bool {
        !self.is_used && self.expiry_date >= today
    }
}

/// A validated warranty ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWarranty {
    pub id: WarrantyId,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub car_plate: String,
    pub receipt: String,
    pub created_at: DateTime<Utc>,
}

impl NewWarranty {
    /// The stored form of this warranty before any claim references it
    pub fn into_warranty(self) -> Warranty {
        Warranty {
            id: self.id,
            name: self.name,
            phone_number: self.phone_number,
            email: self.email,
            purchase_date: self.purchase_date,
            expiry_date: self.expiry_date,
            car_plate: self.car_plate,
            receipt: self.receipt,
            is_used: false,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Registration request as submitted by a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterWarranty {
    #[validate(length(min = 1, max = 200, message = "name must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "phone number must be 1 to 50 characters"))]
    pub phone_number: String,
    #[validate(
        email(message = "email is not a valid address"),
        length(max = 254, message = "email may have at most 254 characters")
    )]
    pub email: Option<String>,
    pub purchase_date: NaiveDate,
    #[validate(length(min = 1, max = 20, message = "car plate must be 1 to 20 characters"))]
    pub car_plate: String,
    #[validate(length(min = 1, message = "receipt is required"))]
    pub receipt: String,
}

impl RegisterWarranty {
    /// Normalises and validates the request, then computes the expiry date
    ///
    /// # Errors
    ///
    /// `WarrantyError::Validation` when a required field is blank or longer
    /// than its column, the email is malformed, the purchase date lies after `today`, or the expiry date
    /// would overflow the calendar.
    pub fn prepare(
        self,
        window: ValidityWindow,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<NewWarranty, WarrantyError> {
        let request = RegisterWarranty {
            name: self.name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            purchase_date: self.purchase_date,
            car_plate: normalize_plate(&self.car_plate),
            receipt: self.receipt.trim().to_string(),
        };

        request
            .validate()
            .map_err(|e| WarrantyError::Validation(describe_validation(&e)))?;

        if request.purchase_date > today {
            return Err(WarrantyError::validation(format!(
                "purchase date {} is in the future",
                request.purchase_date
            )));
        }

        let expiry_date = window.expiry_for(request.purchase_date).ok_or_else(|| {
            WarrantyError::validation("purchase date is out of the supported range")
        })?;

        Ok(NewWarranty {
            id: WarrantyId::new_v7(),
            name: request.name,
            phone_number: request.phone_number,
            email: request.email,
            purchase_date: request.purchase_date,
            expiry_date,
            car_plate: request.car_plate,
            receipt: request.receipt,
            created_at: now,
        })
    }
}

/// Canonical form of a car plate: no whitespace, upper-case
///
/// `"abc 123"` and `" ABC123 "` both become `"ABC123"`.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// How long a warranty stays claimable after the purchase date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "length", rename_all = "snake_case")]
pub enum ValidityWindow {
    Months(u32),
    Days(u32),
}

impl ValidityWindow {
    /// Expiry date for a purchase on `purchase_date`
    ///
    /// Month arithmetic clamps to the last day of the target month, so a
    /// purchase on 31 August with a 6 month window expires on 28/29 February.
    pub fn expiry_for(&self, purchase_date: NaiveDate) -> Option<NaiveDate> {
        match *self {
            ValidityWindow::Months(n) => purchase_date.checked_add_months(Months::new(n)),
            ValidityWindow::Days(n) => purchase_date.checked_add_days(Days::new(u64::from(n))),
        }
    }

    /// Human-readable form used in confirmation emails
    pub fn describe(&self) -> String {
        match *self {
            ValidityWindow::Months(1) => "1 month".to_string(),
            ValidityWindow::Months(n) => format!("{} months", n),
            ValidityWindow::Days(1) => "1 day".to_string(),
            ValidityWindow::Days(n) => format!("{} days", n),
        }
    }
}

impl Default for ValidityWindow {
    fn default() -> Self {
        ValidityWindow::Months(6)
    }
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityWindow::Months(n) => write!(f, "{}m", n),
            ValidityWindow::Days(n) => write!(f, "{}d", n),
        }
    }
}

impl FromStr for ValidityWindow {
    type Err = WarrantyError;

    /// Parses `6m`, `6 months`, `15d` or `15 days`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| WarrantyError::validation(format!("validity window '{}' has no unit", s)))?;
        let (digits, unit) = s.split_at(split);
        let length: u32 = digits
            .parse()
            .map_err(|_| WarrantyError::validation(format!("validity window '{}' has no length", s)))?;
        if length == 0 {
            return Err(WarrantyError::validation("validity window must be at least 1"));
        }

        match unit.trim() {
            "m" | "month" | "months" => Ok(ValidityWindow::Months(length)),
            "d" | "day" | "days" => Ok(ValidityWindow::Days(length)),
            other => Err(WarrantyError::validation(format!(
                "unknown validity window unit '{}'",
                other
            ))),
        }
    }
}
