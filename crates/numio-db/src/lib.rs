//! Numio Database Layer
//!
//! PostgreSQL access and repository implementations for the Numio number
//! rental platform:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for catalog, prices, users, and requests
//! - Transaction support for the ledger and lifecycle services

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use numio_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
