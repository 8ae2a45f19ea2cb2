//! Authentication handlers
//!
//! HTTP handlers for the admin API login endpoint.

use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::dto::ApiResponse;
use actix_web::{cookie::Cookie, web, HttpResponse};
use numio_auth::{JwtService, PasswordService};
use numio_core::models::UserRole;
use numio_core::AppError;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    #[allow(dead_code)]
    id: i32,
    username: String,
    password_hash: String,
    role: String,
    is_active: bool,
}

/// Login endpoint
///
/// POST /api/v1/auth/login
#[instrument(skip(pool, jwt_service, password_service, req))]
pub async fn login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<Arc<JwtService>>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Login validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let username = req.username.trim();

    debug!(username = %username, "Processing login request");

    let admin: Option<AdminRow> = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, role, is_active
        FROM admin_users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!("Failed to load admin user: {}", e);
        AppError::Database(format!("Failed to load admin user: {}", e))
    })?;

    let admin = admin.ok_or_else(|| {
        info!(username = %username, "Login failed: user not found");
        AppError::InvalidCredentials
    })?;

    if !admin.is_active {
        warn!(username = %username, "Login failed: user is inactive");
        return Err(AppError::InvalidCredentials);
    }

    let password_valid = password_service
        .verify_password(&req.password, &admin.password_hash)
        .map_err(|e| {
            error!("Password verification error: {}", e);
            AppError::Internal("Password verification failed".to_string())
        })?;

    if !password_valid {
        info!(username = %username, "Login failed: invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let role = UserRole::from_str(&admin.role).unwrap_or(UserRole::Operator);
    let token = jwt_service.create_token_for_user(&admin.username, role)?;
    let expires_in = jwt_service.expiration_secs();

    info!(username = %username, role = %role, "Login successful");

    let response = LoginResponse {
        token: token.clone(),
        expires_in,
        role: role.to_string(),
    };

    // Browser clients read the cookie, API clients read the body
    let cookie = Cookie::build("token", token)
        .path("/")
        .http_only(true)
        .max_age(actix_web::cookie::time::Duration::seconds(expires_in))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::success(response)))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").route("/login", web::post().to(login)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let valid_req = LoginRequest {
            username: "admin".to_string(),
            password: "password".to_string(),
        };
        assert!(valid_req.validate().is_ok());

        let invalid_req = LoginRequest {
            username: "".to_string(),
            password: "".to_string(),
        };
        assert!(invalid_req.validate().is_err());
    }

    #[test]
    fn test_role_parse_defaults_to_operator() {
        assert_eq!(UserRole::from_str("bogus"), None);
        let role = UserRole::from_str("bogus").unwrap_or(UserRole::Operator);
        assert_eq!(role, UserRole::Operator);
    }
}
