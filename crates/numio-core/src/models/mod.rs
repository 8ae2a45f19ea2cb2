//! Domain models for numio
//!
//! This module contains all the core domain models used throughout the application.

pub mod catalog;
pub mod price;
pub mod request;
pub mod user;

pub use catalog::{AppCategory, Application, Country};
pub use price::{BulkTier, PriceEntry};
pub use request::{NumberRequest, RequestStatus, SmsMessage};
pub use user::{ApiUser, BalanceTransaction, PaymentMethod, TransactionKind, UserRole};
