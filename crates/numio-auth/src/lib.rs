//! Authentication and authorization for Numio
//!
//! JWT-based authentication for the admin API, Argon2 password hashing, and
//! Actix-web extractors for both the admin API and the API-key-authenticated
//! control facade.
//!
//! # Examples
//!
//! ## Creating a JWT token
//!
//! ```no_run
//! use numio_auth::{JwtService, Claims};
//! use numio_core::models::UserRole;
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let claims = Claims::new("admin", UserRole::Admin);
//! let token = jwt_service.create_token(&claims)?;
//! # Ok::<(), numio_core::error::AppError>(())
//! ```
//!
//! ## Password hashing
//!
//! ```no_run
//! use numio_auth::PasswordService;
//!
//! let password_service = PasswordService::new();
//! let hash = password_service.hash_password("secure_password")?;
//! let is_valid = password_service.verify_password("secure_password", &hash)?;
//! assert!(is_valid);
//! # Ok::<(), numio_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AdminUser, ApiToken, AuthenticatedUser};
pub use password::PasswordService;

#[cfg(test)]
mod tests {
    use super::*;
    use numio_core::models::UserRole;

    #[test]
    fn test_integration_jwt_and_password() {
        let password_service = PasswordService::new();
        let jwt_service = JwtService::new("test-secret-key-12345", 3600);

        let password = "my_secure_password";
        let hash = password_service.hash_password(password).unwrap();
        assert!(password_service.verify_password(password, &hash).unwrap());
        assert!(!password_service
            .verify_password("wrong_password", &hash)
            .unwrap());

        let claims = Claims::new("testuser", UserRole::Admin);
        let token = jwt_service.create_token(&claims).unwrap();
        let decoded_claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(decoded_claims.sub, "testuser");
        assert_eq!(decoded_claims.role, UserRole::Admin);
    }
}
