//! Price table repository implementation
//!
//! One row per (country, application) pair, enforced by a unique constraint.
//! Writes go through `INSERT ... ON CONFLICT DO UPDATE`, so concurrent
//! upserts for the same pair serialize last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use numio_core::{
    models::{BulkTier, PriceEntry},
    traits::PriceRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

const PRICE_COLUMNS: &str = r#"
    id, country_id, application_id, cost, currency, count,
    discount_percent, bulk_tiers, is_active, updated_by,
    created_at, updated_at
"#;

/// PostgreSQL implementation of PriceRepository
pub struct PgPriceRepository {
    pool: PgPool,
}

impl PgPriceRepository {
    /// Create a new price repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceRepository for PgPriceRepository {
    #[instrument(skip(self))]
    async fn get_price(
        &self,
        country_id: i32,
        application_id: i32,
    ) -> AppResult<Option<PriceEntry>> {
        debug!("Finding price for ({}, {})", country_id, application_id);

        let row = sqlx::query_as::<sqlx::Postgres, PriceRow>(&format!(
            r#"
            SELECT {PRICE_COLUMNS}
            FROM prices
            WHERE country_id = $1 AND application_id = $2 AND is_active = TRUE
            "#,
        ))
        .bind(country_id)
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding price ({}, {}): {}",
                country_id, application_id, e
            );
            AppError::Database(format!("Failed to find price: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_by_country(&self, country_id: i32) -> AppResult<Vec<PriceEntry>> {
        debug!("Listing prices for country {}", country_id);

        let rows = sqlx::query_as::<sqlx::Postgres, PriceRow>(&format!(
            r#"
            SELECT {PRICE_COLUMNS}
            FROM prices
            WHERE country_id = $1 AND is_active = TRUE
            ORDER BY application_id ASC
            "#,
        ))
        .bind(country_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error listing prices for country {}: {}",
                country_id, e
            );
            AppError::Database(format!("Failed to fetch prices: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn upsert_price(
        &self,
        country_id: i32,
        application_id: i32,
        cost: Decimal,
        updated_by: &str,
    ) -> AppResult<PriceEntry> {
        debug!(
            "Upserting price ({}, {}) -> {}",
            country_id, application_id, cost
        );

        let row = sqlx::query_as::<sqlx::Postgres, PriceRow>(&format!(
            r#"
            INSERT INTO prices (country_id, application_id, cost, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (country_id, application_id)
            DO UPDATE SET
                cost = EXCLUDED.cost,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {PRICE_COLUMNS}
            "#,
        ))
        .bind(country_id)
        .bind(application_id)
        .bind(cost)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error upserting price ({}, {}): {}",
                country_id, application_id, e
            );
            AppError::Database(format!("Failed to upsert price: {}", e))
        })?;

        Ok(row.into())
    }
}

/// Database row for price entries
///
/// `bulk_tiers` is a JSONB column holding an array of tier objects.
#[derive(sqlx::FromRow)]
struct PriceRow {
    id: i32,
    country_id: i32,
    application_id: i32,
    cost: Decimal,
    currency: String,
    count: i64,
    discount_percent: Decimal,
    bulk_tiers: serde_json::Value,
    is_active: bool,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PriceRow> for PriceEntry {
    fn from(row: PriceRow) -> Self {
        let bulk_tiers: Vec<BulkTier> =
            serde_json::from_value(row.bulk_tiers).unwrap_or_else(|e| {
                warn!("Malformed bulk_tiers for price {}: {}", row.id, e);
                Vec::new()
            });

        Self {
            id: row.id,
            country_id: row.country_id,
            application_id: row.application_id,
            cost: row.cost,
            currency: row.currency,
            count: row.count,
            discount_percent: row.discount_percent,
            bulk_tiers,
            is_active: row.is_active,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_with_tiers(tiers: serde_json::Value) -> PriceRow {
        PriceRow {
            id: 1,
            country_id: 7,
            application_id: 12,
            cost: Decimal::new(30, 2),
            currency: "USD".to_string(),
            count: 100,
            discount_percent: Decimal::ZERO,
            bulk_tiers: tiers,
            is_active: true,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bulk_tiers_decode() {
        let row = row_with_tiers(json!([
            {"min_qty": 10, "max_qty": 50, "discount_percent": "20"}
        ]));
        let entry: PriceEntry = row.into();
        assert_eq!(entry.bulk_tiers.len(), 1);
        assert_eq!(entry.bulk_tiers[0].min_qty, 10);
    }

    #[test]
    fn test_malformed_bulk_tiers_degrade_to_empty() {
        let row = row_with_tiers(json!({"not": "an array"}));
        let entry: PriceEntry = row.into();
        assert!(entry.bulk_tiers.is_empty());
    }
}
