//! Password hashing and verification using Argon2
//!
//! Admin-API credentials are hashed with Argon2id in PHC string format.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use numio_core::error::AppError;
use rand_core::OsRng;
use tracing::{debug, error};

/// Password hashing service using Argon2
#[derive(Debug, Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a new password service with default Argon2 parameters
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hash a password using Argon2
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` if hashing fails
    ///
    /// # Examples
    ///
    /// ```
    /// use numio_auth::PasswordService;
    ///
    /// let password_service = PasswordService::new();
    /// let hash = password_service.hash_password("my_secure_password")?;
    /// # Ok::<(), numio_core::error::AppError>(())
    /// ```
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        debug!("Hashing password");

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AppError::PasswordHash(format!("Password hashing failed: {}", e))
            })?;

        Ok(password_hash.to_string())
    }

    /// Verify a password against a hash
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if it doesn't.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` if the hash cannot be parsed
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        debug!("Verifying password");

        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "Failed to parse password hash");
            AppError::PasswordHash(format!("Invalid password hash format: {}", e))
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}
