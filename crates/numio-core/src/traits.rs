//! Common traits for repositories, caching, and the upstream number provider
//!
//! Defines abstractions for database access and external collaborators so the
//! service layer stays testable and provider-agnostic.

use crate::error::AppError;
use crate::models::{
    ApiUser, Application, Country, NumberRequest, PriceEntry, SmsMessage,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

/// Country/application catalog repository
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active countries sorted by priority, then title
    async fn active_countries(&self) -> Result<Vec<Country>, AppError>;

    /// Active applications sorted by priority, then name
    async fn active_applications(&self) -> Result<Vec<Application>, AppError>;

    /// Find a country by id, active entries only
    async fn find_active_country(&self, id: i32) -> Result<Option<Country>, AppError>;

    /// Find an application by id, active entries only
    async fn find_active_application(&self, id: i32) -> Result<Option<Application>, AppError>;
}

/// Price table repository
///
/// Active filtering is strictly boolean: an entry is purchasable iff
/// `is_active = TRUE`.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Active price entry for a (country, application) pair
    async fn get_price(
        &self,
        country_id: i32,
        application_id: i32,
    ) -> Result<Option<PriceEntry>, AppError>;

    /// Active price entries for one country
    async fn list_by_country(&self, country_id: i32) -> Result<Vec<PriceEntry>, AppError>;

    /// Create or overwrite the entry for a (country, application) pair
    ///
    /// Concurrent upserts for the same key serialize last-write-wins and can
    /// never produce two rows for the key.
    async fn upsert_price(
        &self,
        country_id: i32,
        application_id: i32,
        cost: Decimal,
        updated_by: &str,
    ) -> Result<PriceEntry, AppError>;
}

/// API user repository
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id
    async fn find_by_id(&self, id: i32) -> Result<Option<ApiUser>, AppError>;

    /// Resolve a facade API key to its user
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiUser>, AppError>;
}

/// Number request repository (read side + maintenance)
///
/// Mutating lifecycle operations live in the lifecycle service, which needs
/// multi-statement transactions across users and requests.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Find a request by its public id
    async fn find_by_request_id(&self, request_id: &str)
        -> Result<Option<NumberRequest>, AppError>;

    /// Find a request by public id, scoped to its owner
    async fn find_for_user(
        &self,
        request_id: &str,
        user_id: i32,
    ) -> Result<Option<NumberRequest>, AppError>;

    /// Append-only SMS history for a request, oldest first
    async fn sms_history(&self, request_id: &str) -> Result<Vec<SmsMessage>, AppError>;

    /// Force-expire every open request past its deadline
    ///
    /// Idempotent; returns the number of requests transitioned.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Upstream number provider contract
///
/// The real carrier integration implements this trait; the shipped demo
/// implementation fabricates numbers and codes locally. Callers wrap every
/// invocation in a timeout and surface `AppError::UpstreamTimeout`.
#[async_trait]
pub trait NumberProvider: Send + Sync {
    /// Allocate a fresh number in the country's numbering format
    async fn allocate(&self, country: &Country) -> Result<String, AppError>;

    /// Coarse count of numbers available for a (country, application) pair
    async fn availability(&self, country_id: i32, application_id: i32) -> Result<i64, AppError>;

    /// Poll the provider for an SMS addressed to this request's number
    async fn fetch_sms(&self, request: &NumberRequest) -> Result<Option<String>, AppError>;
}

/// Cache service trait
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Get value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Set value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError>;

    /// Delete value from cache
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
}
