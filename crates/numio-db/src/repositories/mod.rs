//! Repository implementations
//!
//! Concrete implementations of the repository traits defined in numio-core,
//! using sqlx for PostgreSQL access.

pub mod catalog_repo;
pub mod price_repo;
pub mod request_repo;
pub mod user_repo;

pub use catalog_repo::PgCatalogRepository;
pub use price_repo::PgPriceRepository;
pub use request_repo::PgRequestRepository;
pub use user_repo::PgUserRepository;
