//! Actix-web authentication extractors
//!
//! Two authentication surfaces coexist:
//!
//! - The admin API uses JWT bearer tokens (`AuthenticatedUser`, `AdminUser`)
//! - The control facade uses per-user API keys (`ApiToken`), accepted as a
//!   `token` query parameter, an `X-Api-Key` header, or a bearer token

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{
    dev::Payload,
    error::{ErrorForbidden, ErrorUnauthorized},
    web, FromRequest, HttpRequest,
};
use futures::future::{ready, Ready};
use numio_core::error::AppError;
use numio_core::models::UserRole;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extract JWT token from request
///
/// Checks for token in the following order:
/// 1. Authorization header (Bearer token)
/// 2. Cookie named "token"
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie) = req.cookie("token") {
        return Some(cookie.value().to_string());
    }

    None
}

/// Extract a facade API key from request
///
/// Checks for the key in the following order:
/// 1. `token` query parameter
/// 2. `X-Api-Key` header
/// 3. Authorization header (Bearer token)
fn extract_api_key_from_request(req: &HttpRequest) -> Option<String> {
    let query = req.query_string();
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("token=") {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    if let Some(header) = req.headers().get("X-Api-Key") {
        if let Ok(key) = header.to_str() {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
    }

    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Authenticated admin-API user extractor
///
/// Extracts and validates a JWT token from the request.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use numio_auth::middleware::AuthenticatedUser;
///
/// async fn protected_handler(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({
///         "username": user.username,
///         "role": user.role
///     }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Username of the authenticated user
    pub username: String,

    /// Role of the authenticated user
    pub role: String,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Get the user's role as a UserRole enum
    pub fn user_role(&self) -> UserRole {
        self.claims.role
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
            Some(service) => service.get_ref().clone(),
            None => {
                warn!("JwtService not found in app data");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "Authentication service not configured".to_string(),
                ))));
            }
        };

        let token = match extract_token_from_request(req) {
            Some(t) => t,
            None => {
                debug!("No authentication token found in request");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "No authentication token provided".to_string(),
                ))));
            }
        };

        match jwt_service.validate_token(&token) {
            Ok(claims) => {
                debug!(
                    username = %claims.sub,
                    role = ?claims.role,
                    "User authenticated successfully"
                );

                ready(Ok(AuthenticatedUser {
                    username: claims.sub.clone(),
                    role: claims.role.to_string(),
                    claims,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                ready(Err(ErrorUnauthorized(e)))
            }
        }
    }
}

/// Admin user extractor
///
/// Requires the admin role; rejects operators.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_admin() {
            warn!(
                username = %auth_user.username,
                role = %auth_user.role,
                "User attempted admin access without privileges"
            );
            return ready(Err(ErrorForbidden(AppError::Forbidden)));
        }

        debug!(
            username = %auth_user.username,
            role = %auth_user.role,
            "Admin access granted"
        );

        ready(Ok(AdminUser(auth_user)))
    }
}

/// Facade API key extractor
///
/// Carries the raw key; the control handlers resolve it to a user through
/// the user repository so an inactive or unknown key fails there.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use numio_auth::middleware::ApiToken;
///
/// async fn facade_handler(token: ApiToken) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiToken(pub String);

impl ApiToken {
    /// Get the raw API key
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl FromRequest for ApiToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match extract_api_key_from_request(req) {
            Some(key) => ready(Ok(ApiToken(key))),
            None => {
                debug!("No API key found in request");
                ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "No API key provided".to_string(),
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn jwt_data() -> web::Data<Arc<JwtService>> {
        web::Data::new(Arc::new(JwtService::new("test-secret", 3600)))
    }

    #[actix_web::test]
    async fn test_authenticated_user_from_bearer() {
        let data = jwt_data();
        let token = data
            .create_token(&Claims::new("alice", UserRole::Operator))
            .unwrap();

        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let user = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin());
    }

    #[actix_web::test]
    async fn test_missing_token_rejected() {
        let req = TestRequest::default()
            .app_data(jwt_data())
            .to_http_request();

        let result = AuthenticatedUser::from_request(&req, &mut Payload::None).await;
        assert!(result.is_err());
    }

    #[actix_web::test]
    async fn test_admin_extractor_rejects_operator() {
        let data = jwt_data();
        let token = data
            .create_token(&Claims::new("bob", UserRole::Operator))
            .unwrap();

        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let err = AdminUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        // A valid token without the admin role is forbidden, not unauthorized
        assert_eq!(
            err.error_response().status(),
            actix_web::http::StatusCode::FORBIDDEN
        );
    }

    #[actix_web::test]
    async fn test_admin_extractor_accepts_admin() {
        let data = jwt_data();
        let token = data
            .create_token(&Claims::new("root", UserRole::Admin))
            .unwrap();

        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let admin = AdminUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(admin.username, "root");
    }

    #[actix_web::test]
    async fn test_api_token_from_query() {
        let req = TestRequest::with_uri("/get-balance?token=abc123").to_http_request();

        let token = ApiToken::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(token.key(), "abc123");
    }

    #[actix_web::test]
    async fn test_api_token_from_header() {
        let req = TestRequest::default()
            .insert_header(("X-Api-Key", "key-from-header"))
            .to_http_request();

        let token = ApiToken::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(token.key(), "key-from-header");
    }

    #[actix_web::test]
    async fn test_api_token_query_wins_over_header() {
        let req = TestRequest::with_uri("/get-number?token=from-query")
            .insert_header(("X-Api-Key", "from-header"))
            .to_http_request();

        let token = ApiToken::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(token.key(), "from-query");
    }

    #[actix_web::test]
    async fn test_api_token_missing_rejected() {
        let req = TestRequest::default().to_http_request();

        let result = ApiToken::from_request(&req, &mut Payload::None).await;
        assert!(result.is_err());
    }
}
