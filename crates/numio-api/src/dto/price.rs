//! Admin price management DTOs

use chrono::{DateTime, Utc};
use numio_core::models::{BulkTier, PriceEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// PUT /admin/prices request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PriceUpsertRequest {
    #[validate(range(min = 1))]
    pub country_id: i32,

    #[validate(range(min = 1))]
    pub application_id: i32,

    /// Base cost for one number; range is enforced by the pricing service
    pub cost: Decimal,
}

/// Full price entry as exposed to admins
#[derive(Debug, Clone, Serialize)]
pub struct PriceEntryResponse {
    pub id: i32,
    pub country_id: i32,
    pub application_id: i32,
    pub cost: Decimal,
    pub currency: String,
    pub count: i64,
    pub discount_percent: Decimal,
    pub bulk_tiers: Vec<BulkTier>,
    pub is_active: bool,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<PriceEntry> for PriceEntryResponse {
    fn from(entry: PriceEntry) -> Self {
        Self {
            id: entry.id,
            country_id: entry.country_id,
            application_id: entry.application_id,
            cost: entry.cost,
            currency: entry.currency,
            count: entry.count,
            discount_percent: entry.discount_percent,
            bulk_tiers: entry.bulk_tiers,
            is_active: entry.is_active,
            updated_by: entry.updated_by,
            updated_at: entry.updated_at,
        }
    }
}

/// Quote query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteQuery {
    #[validate(range(min = 1))]
    pub country_id: i32,

    #[validate(range(min = 1))]
    pub application_id: i32,

    /// Quantity the quote is for
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Quote response
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub country_id: i32,
    pub application_id: i32,
    pub quantity: u32,
    /// Final unit price after discounts, two decimal places
    pub unit_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_upsert_request_validation() {
        let valid = PriceUpsertRequest {
            country_id: 7,
            application_id: 12,
            cost: dec!(0.30),
        };
        assert!(valid.validate().is_ok());

        let invalid = PriceUpsertRequest {
            country_id: 0,
            application_id: 12,
            cost: dec!(0.30),
        };
        assert!(invalid.validate().is_err());
    }
}
