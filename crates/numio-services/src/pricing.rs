//! Pricing service
//!
//! Price lookups go cache-first with a database fallback: a Redis failure is
//! logged and degrades to the database, it never fails the request. Admin
//! writes invalidate the affected keys before returning, so a read after a
//! successful write observes the new price.

use numio_core::{
    models::PriceEntry,
    traits::{CacheService, PriceRepository},
    AppError, AppResult,
};
use numio_cache::keys;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::constants::{MAX_PRICE, MIN_PRICE};

/// Pricing service with Redis read-through caching
pub struct PricingService<P: PriceRepository, C: CacheService> {
    price_repo: Arc<P>,
    cache: Arc<C>,
    cache_ttl_secs: u64,
}

impl<P: PriceRepository, C: CacheService> PricingService<P, C> {
    /// Create a new pricing service caching entries for `cache_ttl_secs`
    pub fn new(price_repo: Arc<P>, cache: Arc<C>, cache_ttl_secs: u64) -> Self {
        Self {
            price_repo,
            cache,
            cache_ttl_secs,
        }
    }

    /// Look up the active price entry for a (country, application) pair
    ///
    /// Tries the cache first; on miss or cache error, reads the database and
    /// repopulates the cache best-effort.
    #[instrument(skip(self))]
    pub async fn get_price(
        &self,
        country_id: i32,
        application_id: i32,
    ) -> AppResult<Option<PriceEntry>> {
        let key = keys::price_key(country_id, application_id);

        match self.cache.get::<PriceEntry>(&key).await {
            Ok(Some(entry)) => {
                debug!("Price cache hit for {}", key);
                return Ok(Some(entry));
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Price cache read failed, falling back to database: {}", e);
            }
        }

        let entry = self.price_repo.get_price(country_id, application_id).await?;

        if let Some(ref entry) = entry {
            if let Err(e) = self.cache.set(&key, entry, self.cache_ttl_secs).await {
                warn!("Failed to cache price {}: {}", key, e);
            }
        }

        Ok(entry)
    }

    /// List all active prices for a country
    #[instrument(skip(self))]
    pub async fn list_by_country(&self, country_id: i32) -> AppResult<Vec<PriceEntry>> {
        let key = keys::country_prices_key(country_id);

        match self.cache.get::<Vec<PriceEntry>>(&key).await {
            Ok(Some(entries)) => {
                debug!("Price list cache hit for country {}", country_id);
                return Ok(entries);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Price list cache read failed: {}", e);
            }
        }

        let entries = self.price_repo.list_by_country(country_id).await?;

        if let Err(e) = self.cache.set(&key, &entries, self.cache_ttl_secs).await {
            warn!("Failed to cache price list for country {}: {}", country_id, e);
        }

        Ok(entries)
    }

    /// Quote the final unit price for a quantity
    ///
    /// Applies the matching bulk tier first, then the general discount, both
    /// multiplicatively, rounded half-up to 2 decimal places.
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        country_id: i32,
        application_id: i32,
        quantity: u32,
    ) -> AppResult<Decimal> {
        let entry = self
            .get_price(country_id, application_id)
            .await?
            .ok_or_else(|| {
                AppError::ServiceUnavailable(format!(
                    "No price for country {} application {}",
                    country_id, application_id
                ))
            })?;

        Ok(entry.final_price(quantity))
    }

    /// Create or overwrite a price entry, then invalidate its cache keys
    ///
    /// Invalidation happens before this returns; cache delete failures are
    /// logged but never fail the write.
    #[instrument(skip(self))]
    pub async fn upsert_price(
        &self,
        country_id: i32,
        application_id: i32,
        cost: Decimal,
        updated_by: &str,
    ) -> AppResult<PriceEntry> {
        if cost < MIN_PRICE || cost > MAX_PRICE {
            return Err(AppError::InvalidParameter(format!(
                "Price {} out of range [{}, {}]",
                cost, MIN_PRICE, MAX_PRICE
            )));
        }

        let entry = self
            .price_repo
            .upsert_price(country_id, application_id, cost, updated_by)
            .await?;

        info!(
            "Price updated for ({}, {}) -> {} by {}",
            country_id, application_id, cost, updated_by
        );

        for key in [
            keys::price_key(country_id, application_id),
            keys::country_prices_key(country_id),
        ] {
            if let Err(e) = self.cache.delete(&key).await {
                warn!("Failed to invalidate cache key {}: {}", key, e);
            }
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use serde::{de::DeserializeOwned, Serialize};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryCache {
        store: Mutex<HashMap<String, String>>,
        last_ttl: Mutex<Option<u64>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheService for MemoryCache {
        async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
            if self.broken {
                return Err(AppError::Cache("down".to_string()));
            }
            Ok(self
                .store
                .lock()
                .get(key)
                .map(|json| serde_json::from_str(json).unwrap()))
        }

        async fn set<T: Serialize + Send + Sync>(
            &self,
            key: &str,
            value: &T,
            ttl_secs: u64,
        ) -> AppResult<()> {
            if self.broken {
                return Err(AppError::Cache("down".to_string()));
            }
            *self.last_ttl.lock() = Some(ttl_secs);
            self.store
                .lock()
                .insert(key.to_string(), serde_json::to_string(value).unwrap());
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<bool> {
            if self.broken {
                return Err(AppError::Cache("down".to_string()));
            }
            Ok(self.store.lock().remove(key).is_some())
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.store.lock().contains_key(key))
        }
    }

    struct MemoryPriceRepo {
        entry: Mutex<Option<PriceEntry>>,
        reads: AtomicUsize,
    }

    impl MemoryPriceRepo {
        fn with_entry(entry: PriceEntry) -> Self {
            Self {
                entry: Mutex::new(Some(entry)),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceRepository for MemoryPriceRepo {
        async fn get_price(
            &self,
            _country_id: i32,
            _application_id: i32,
        ) -> AppResult<Option<PriceEntry>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.entry.lock().clone())
        }

        async fn list_by_country(&self, _country_id: i32) -> AppResult<Vec<PriceEntry>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.entry.lock().clone().into_iter().collect())
        }

        async fn upsert_price(
            &self,
            country_id: i32,
            application_id: i32,
            cost: Decimal,
            updated_by: &str,
        ) -> AppResult<PriceEntry> {
            let entry = PriceEntry {
                country_id,
                application_id,
                cost,
                updated_by: Some(updated_by.to_string()),
                updated_at: Utc::now(),
                ..Default::default()
            };
            *self.entry.lock() = Some(entry.clone());
            Ok(entry)
        }
    }

    fn sample_entry() -> PriceEntry {
        PriceEntry {
            country_id: 7,
            application_id: 12,
            cost: dec!(0.30),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_price_populates_cache() {
        let repo = Arc::new(MemoryPriceRepo::with_entry(sample_entry()));
        let cache = Arc::new(MemoryCache::default());
        let service = PricingService::new(repo.clone(), cache.clone(), 300);

        let first = service.get_price(7, 12).await.unwrap().unwrap();
        assert_eq!(first.cost, dec!(0.30));
        assert_eq!(repo.reads.load(Ordering::SeqCst), 1);

        // Second read is served from cache
        let second = service.get_price(7, 12).await.unwrap().unwrap();
        assert_eq!(second.cost, dec!(0.30));
        assert_eq!(repo.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_database() {
        let repo = Arc::new(MemoryPriceRepo::with_entry(sample_entry()));
        let cache = Arc::new(MemoryCache {
            broken: true,
            ..Default::default()
        });
        let service = PricingService::new(repo.clone(), cache, 300);

        let entry = service.get_price(7, 12).await.unwrap().unwrap();
        assert_eq!(entry.cost, dec!(0.30));
    }

    #[tokio::test]
    async fn test_cache_writes_use_configured_ttl() {
        let repo = Arc::new(MemoryPriceRepo::with_entry(sample_entry()));
        let cache = Arc::new(MemoryCache::default());
        let service = PricingService::new(repo, cache.clone(), 42);

        service.get_price(7, 12).await.unwrap();
        assert_eq!(*cache.last_ttl.lock(), Some(42));
    }

    #[tokio::test]
    async fn test_quote_missing_price_is_unavailable() {
        let repo = Arc::new(MemoryPriceRepo {
            entry: Mutex::new(None),
            reads: AtomicUsize::new(0),
        });
        let service = PricingService::new(repo, Arc::new(MemoryCache::default()), 300);

        let result = service.quote(7, 12, 1).await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_upsert_invalidates_cache() {
        let repo = Arc::new(MemoryPriceRepo::with_entry(sample_entry()));
        let cache = Arc::new(MemoryCache::default());
        let service = PricingService::new(repo.clone(), cache.clone(), 300);

        // Warm the cache
        service.get_price(7, 12).await.unwrap();
        assert!(cache.exists(&keys::price_key(7, 12)).await.unwrap());

        service.upsert_price(7, 12, dec!(0.45), "admin").await.unwrap();
        assert!(!cache.exists(&keys::price_key(7, 12)).await.unwrap());

        // Next read observes the new price
        let entry = service.get_price(7, 12).await.unwrap().unwrap();
        assert_eq!(entry.cost, dec!(0.45));
    }

    #[tokio::test]
    async fn test_upsert_rejects_out_of_range() {
        let repo = Arc::new(MemoryPriceRepo::with_entry(sample_entry()));
        let service = PricingService::new(repo, Arc::new(MemoryCache::default()), 300);

        let result = service.upsert_price(7, 12, dec!(0.00), "admin").await;
        assert!(matches!(result, Err(AppError::InvalidParameter(_))));

        let result = service.upsert_price(7, 12, dec!(5000), "admin").await;
        assert!(matches!(result, Err(AppError::InvalidParameter(_))));
    }
}
