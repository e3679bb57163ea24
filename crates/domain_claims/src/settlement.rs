//! Settlement payloads: tyre line items for approvals, reasons for rejections

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, TyreDetailId};
use crate::error::ClaimError;

/// Most tyres a single claim can replace
pub const MAX_TYRES_PER_CLAIM: usize = 4;

/// Decimal places accepted on a tyre cost
pub const COST_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12, 2)` cost or total can hold: 9,999,999,999.99
pub const MAX_COST: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

pub const MAX_BRAND_LEN: usize = 100;
pub const MAX_SIZE_LEN: usize = 50;

/// A replacement tyre as submitted with an approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyreLineItem {
    pub brand: String,
    pub size: String,
    pub cost: Decimal,
}

/// A stored replacement tyre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyreDetail {
    pub id: TyreDetailId,
    pub claim_id: ClaimId,
    pub brand: String,
    pub size: String,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Validated tyre line items with their total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    items: Vec<TyreLineItem>,
    total_cost: Decimal,
}

impl Settlement {
    /// Validates the line items of an approval
    ///
    /// Requires between one and [`MAX_TYRES_PER_CLAIM`] items, each with a
    /// brand, a size and a non-negative cost of at most two decimal places.
    /// Each cost and the total are capped at [`MAX_COST`].
    pub fn new(items: Vec<TyreLineItem>) -> Result<Self, ClaimError> {
        if items.is_empty() {
            return Err(ClaimError::validation("an approval needs at least one tyre"));
        }
        if items.len() > MAX_TYRES_PER_CLAIM {
            return Err(ClaimError::validation(format!(
                "an approval may replace at most {} tyres, got {}",
                MAX_TYRES_PER_CLAIM,
                items.len()
            )));
        }

        let mut cleaned = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let position = index + 1;
            let brand = item.brand.trim().to_string();
            let size = item.size.trim().to_string();
            if brand.is_empty() {
                return Err(ClaimError::validation(format!("tyre {}: brand is required", position)));
            }
            if size.is_empty() {
                return Err(ClaimError::validation(format!("tyre {}: size is required", position)));
            }
            if brand.chars().count() > MAX_BRAND_LEN || size.chars().count() > MAX_SIZE_LEN {
                return Err(ClaimError::validation(format!(
                    "tyre {}: brand may have at most {} and size at most {} characters",
                    position, MAX_BRAND_LEN, MAX_SIZE_LEN
                )));
            }
            if item.cost < Decimal::ZERO {
                return Err(ClaimError::validation(format!(
                    "tyre {}: cost must not be negative",
                    position
                )));
            }
            if item.cost > MAX_COST {
                return Err(ClaimError::validation(format!(
                    "tyre {}: cost may not exceed {}",
                    position, MAX_COST
                )));
            }
            if item.cost.normalize().scale() > COST_SCALE {
                return Err(ClaimError::validation(format!(
                    "tyre {}: cost may have at most {} decimal places",
                    position, COST_SCALE
                )));
            }
            cleaned.push(TyreLineItem {
                brand,
                size,
                cost: item.cost,
            });
        }

        let total_cost = cleaned
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.cost))
            .filter(|total| *total <= MAX_COST)
            .ok_or_else(|| {
                ClaimError::validation(format!("total cost may not exceed {}", MAX_COST))
            })?;
        Ok(Self {
            items: cleaned,
            total_cost,
        })
    }

    pub fn items(&self) -> &[TyreLineItem] {
        &self.items
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    /// Assigns identifiers to the line items for `claim_id`
    pub fn into_details(self, claim_id: ClaimId, at: DateTime<Utc>) -> (Vec<TyreDetail>, Decimal) {
        let details = self
            .items
            .into_iter()
            .map(|item| TyreDetail {
                id: TyreDetailId::new_v7(),
                claim_id,
                brand: item.brand,
                size: item.size,
                cost: item.cost,
                created_at: at,
            })
            .collect();
        (details, self.total_cost)
    }
}

/// Trims a rejection reason and refuses blank ones
pub fn rejection_reason(raw: &str) -> Result<String, ClaimError> {
    let reason = raw.trim();
    if reason.is_empty() {
        return Err(ClaimError::validation("a rejection reason is required"));
    }
    Ok(reason.to_string())
}
