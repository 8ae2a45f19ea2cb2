//! Business logic services for Numio
//!
//! This crate contains the services that orchestrate number rentals:
//! pricing, the balance ledger, the request lifecycle, and expiry sweeping.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies (repositories, cache, pool)
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `PricingService` - Price lookup and quoting with Redis caching
//! - `LedgerService` - Balance credits and debits with an append-only ledger
//! - `LifecycleService` - Number request creation, SMS delivery, status moves
//! - `ExpirySweeper` - Periodic force-expiry of overdue requests
//! - `LocalNumberPool` - Demo `NumberProvider` that fabricates numbers locally

pub mod ledger;
pub mod lifecycle;
pub mod pricing;
pub mod provider;
pub mod sweeper;

pub use ledger::{LedgerService, LedgerStore, PgLedgerStore};
pub use lifecycle::LifecycleService;
pub use pricing::PricingService;
pub use provider::LocalNumberPool;
pub use sweeper::ExpirySweeper;

/// Business logic constants
pub mod constants {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Default national subscriber digits for generated numbers
    pub const SUBSCRIBER_DIGITS: usize = 10;

    /// Smallest price an admin may set
    pub const MIN_PRICE: Decimal = dec!(0.01);

    /// Largest price an admin may set
    pub const MAX_PRICE: Decimal = dec!(1000.00);
}
