//! Price table model
//!
//! Each (country, application) pair carries one price entry with an optional
//! general discount and quantity-based bulk discount tiers.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Quantity range with an associated percentage discount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTier {
    /// Minimum quantity (inclusive)
    pub min_qty: u32,

    /// Maximum quantity (inclusive)
    pub max_qty: u32,

    /// Discount percentage in [0, 100]
    pub discount_percent: Decimal,
}

impl BulkTier {
    /// Check whether a quantity falls inside this tier
    #[inline]
    pub fn matches(&self, quantity: u32) -> bool {
        self.min_qty <= quantity && quantity <= self.max_qty
    }
}

/// Price entry for one (country, application) pair
///
/// At most one active entry exists per pair (enforced by a unique constraint
/// and upsert semantics in the repository).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Unique identifier
    pub id: i32,

    /// Country this price applies to
    pub country_id: i32,

    /// Application this price applies to
    pub application_id: i32,

    /// Base cost for one number
    pub cost: Decimal,

    /// Currency code (ISO 4217)
    pub currency: String,

    /// Coarse availability count reported to callers
    pub count: i64,

    /// General discount percentage in [0, 100], applied after any bulk tier
    pub discount_percent: Decimal,

    /// Bulk discount tiers; the first matching tier wins
    pub bulk_tiers: Vec<BulkTier>,

    /// Whether this entry is currently purchasable
    pub is_active: bool,

    /// Who last updated this entry
    pub updated_by: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PriceEntry {
    /// Find the first bulk tier covering `quantity`
    pub fn bulk_tier_for(&self, quantity: u32) -> Option<&BulkTier> {
        self.bulk_tiers.iter().find(|t| t.matches(quantity))
    }

    /// Compute the final unit price for a given quantity
    ///
    /// The matching bulk tier is applied first, then the general discount,
    /// both multiplicatively. The result is rounded to 2 decimal places with
    /// half-up rounding. Discounts are clamped to [0, 100] so the price can
    /// never go negative.
    pub fn final_price(&self, quantity: u32) -> Decimal {
        let hundred = Decimal::from(100);
        let mut price = self.cost;

        if let Some(tier) = self.bulk_tier_for(quantity) {
            let pct = tier.discount_percent.clamp(Decimal::ZERO, hundred);
            price *= (hundred - pct) / hundred;
        }

        let general = self.discount_percent.clamp(Decimal::ZERO, hundred);
        if general > Decimal::ZERO {
            price *= (hundred - general) / hundred;
        }

        price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Default for PriceEntry {
    fn default() -> Self {
        Self {
            id: 0,
            country_id: 0,
            application_id: 0,
            cost: Decimal::ZERO,
            currency: "USD".to_string(),
            count: 0,
            discount_percent: Decimal::ZERO,
            bulk_tiers: Vec::new(),
            is_active: true,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
