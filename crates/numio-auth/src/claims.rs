//! JWT Claims structure

use chrono::{Duration, Utc};
use numio_core::models::UserRole;
use serde::{Deserialize, Serialize};

/// JWT Claims
///
/// Standard claims used in admin-API tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User role
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims with the specified username and role
    ///
    /// # Examples
    ///
    /// ```
    /// use numio_auth::Claims;
    /// use numio_core::models::UserRole;
    ///
    /// let claims = Claims::new("admin", UserRole::Admin);
    /// assert_eq!(claims.sub, "admin");
    /// assert_eq!(claims.role, UserRole::Admin);
    /// ```
    pub fn new(username: &str, role: UserRole) -> Self {
        let now = Utc::now();

        Self {
            sub: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: 0, // Will be set by JwtService
        }
    }

    /// Create new claims with custom expiration duration
    pub fn with_expiration(username: &str, role: UserRole, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            sub: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.exp <= now
    }

    /// Get the username from the claims
    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Get the user role
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("testuser", UserRole::Operator);
        assert_eq!(claims.sub, "testuser");
        assert_eq!(claims.role, UserRole::Operator);
        assert!(claims.iat > 0);
    }

    #[test]
    fn test_claims_with_expiration() {
        let claims = Claims::with_expiration("admin", UserRole::Admin, 3600);
        assert!(!claims.is_expired());

        let now = Utc::now().timestamp();
        assert!(claims.exp > now);
        assert!(claims.exp <= now + 3600);
    }

    #[test]
    fn test_expired_claims() {
        let mut claims = Claims::new("user", UserRole::Operator);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_role_checks() {
        assert!(!Claims::new("operator", UserRole::Operator).is_admin());
        assert!(Claims::new("admin", UserRole::Admin).is_admin());
    }
}
