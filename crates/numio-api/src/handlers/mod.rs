//! HTTP request handlers

pub mod auth;
pub mod control;
pub mod payment;
pub mod price;
pub mod request;

pub use auth::configure as configure_auth;
pub use control::configure as configure_control;
pub use payment::configure as configure_payments;
pub use price::configure as configure_prices;
pub use request::configure as configure_requests;
