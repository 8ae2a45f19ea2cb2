//! Data transfer objects for the HTTP API

pub mod auth;
pub mod common;
pub mod control;
pub mod payment;
pub mod price;
pub mod request;

pub use common::ApiResponse;
