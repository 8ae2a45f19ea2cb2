//! HTTP API layer for Numio
//!
//! Two surfaces share one process: the API-key-authenticated control facade
//! (`/api/control`) that number-rental clients integrate against, and the
//! JWT-authenticated admin API (`/api/v1`) for prices, payments, and request
//! operations.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs
)]

pub mod dto;
pub mod handlers;

// Re-export DTOs (common types)
pub use dto::ApiResponse;

// Re-export handler configuration functions
pub use handlers::{
    configure_auth, configure_control, configure_payments, configure_prices, configure_requests,
};

/// Pricing service as wired in `main`: Postgres-backed prices, Redis cache
pub type AppPricing =
    numio_services::PricingService<numio_db::PgPriceRepository, numio_cache::RedisCache>;

/// Ledger service as wired in `main`: Postgres-backed store
pub type AppLedger = numio_services::LedgerService<numio_services::PgLedgerStore>;

/// Lifecycle service as wired in `main`: local number pool provider
pub type AppLifecycle = numio_services::LifecycleService<numio_services::LocalNumberPool>;

/// Expiry sweeper as wired in `main`: Postgres-backed request repository
pub type AppSweeper = numio_services::ExpirySweeper<numio_db::PgRequestRepository>;
