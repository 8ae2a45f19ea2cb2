//! Authentication DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    /// Password
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Login response body
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Bearer token for the admin API
    pub token: String,

    /// Token lifetime in seconds
    pub expires_in: i64,

    /// Role granted to the token
    pub role: String,
}
