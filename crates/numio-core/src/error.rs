//! Unified error handling for numio
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Cache Errors ====================
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Authentication Errors ====================
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ==================== Business Logic Errors ====================
    /// Reported as 400 on the control facade: a purchase the caller cannot
    /// afford is a bad request, not a payment negotiation.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: String, available: String },

    #[error("Duplicate payment reference: {0}")]
    DuplicatePayment(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Request expired: {0}")]
    AlreadyExpired(String),

    /// Country/application/price combination exists but is not rentable.
    #[error("Service not available: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream provider timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidParameter(_)
            | AppError::MissingField(_)
            | AppError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidCredentials
            | AppError::InvalidToken(_)
            | AppError::TokenExpired
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::RequestNotFound(_)
            | AppError::UserNotFound(_)
            | AppError::NotFound(_)
            | AppError::AlreadyExpired(_)
            | AppError::ServiceUnavailable(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_)
            | AppError::AlreadyExists(_)
            | AppError::DuplicatePayment(_)
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,

            // 504 Gateway Timeout
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::PasswordHash(_) => "password_error",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::DuplicatePayment(_) => "duplicate_payment",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::AlreadyExpired(_) => "request_expired",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::UpstreamTimeout(_) => "upstream_timeout",
            AppError::RequestNotFound(_) => "request_not_found",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidParameter(_) => "invalid_parameter",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InsufficientBalance {
                required: "0.30".to_string(),
                available: "0.10".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RequestNotFound("abc".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AlreadyExpired("abc".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ServiceUnavailable("country 7".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DuplicatePayment("pay_123".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "used".to_string(),
                to: "ready".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::UpstreamTimeout("sms provider".to_string()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Unauthorized("missing token".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::DuplicatePayment("pay_123".to_string()).error_code(),
            "duplicate_payment"
        );
        assert_eq!(
            AppError::AlreadyExpired("abc".to_string()).error_code(),
            "request_expired"
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "expired".to_string(),
                to: "close".to_string()
            }
            .error_code(),
            "invalid_transition"
        );
    }
}
