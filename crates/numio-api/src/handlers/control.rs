//! Control facade handlers
//!
//! The public, API-key-authenticated surface existing clients integrate
//! against. Response shapes are a compatibility contract; see the control
//! DTOs before changing anything here.

use crate::dto::control::{
    price_map, ApplicationItem, BalanceResponse, CountryItem, CountryQuery, LimitEntry,
    NumberResponse, PairQuery, RequestQuery, SetStatusQuery, SetStatusResponse, SmsResponse,
};
use crate::{AppLifecycle, AppPricing};
use actix_web::{web, HttpResponse};
use numio_auth::ApiToken;
use numio_core::models::{ApiUser, RequestStatus};
use numio_core::traits::{CatalogRepository, UserRepository};
use numio_core::AppError;
use numio_db::{PgCatalogRepository, PgUserRepository};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

/// Resolve a facade API key to its owning user
async fn resolve_user(pool: &PgPool, token: &ApiToken) -> Result<ApiUser, AppError> {
    let repo = PgUserRepository::new(pool.clone());
    repo.find_by_api_key(token.key()).await?.ok_or_else(|| {
        debug!("Unknown or inactive API key");
        AppError::Unauthorized("Invalid API key".to_string())
    })
}

/// Get user balance
///
/// GET /api/control/get-balance
#[instrument(skip(pool, token))]
pub async fn get_balance(
    pool: web::Data<PgPool>,
    token: ApiToken,
) -> Result<HttpResponse, AppError> {
    let user = resolve_user(pool.get_ref(), &token).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::new(user.balance)))
}

/// Get available numbers for a (country, application) pair
///
/// GET /api/control/limits
#[instrument(skip(pool, pricing, lifecycle, token))]
pub async fn limits(
    pool: web::Data<PgPool>,
    pricing: web::Data<AppPricing>,
    lifecycle: web::Data<AppLifecycle>,
    token: ApiToken,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, AppError> {
    resolve_user(pool.get_ref(), &token).await?;

    // A missing or inactive pair reports zero availability, not an error
    let offered = pricing
        .get_price(query.country_id, query.application_id)
        .await?
        .is_some();
    let numbers = if offered {
        lifecycle
            .availability(query.country_id, query.application_id)
            .await?
    } else {
        0
    };

    Ok(HttpResponse::Ok().json(vec![LimitEntry {
        application_id: query.application_id,
        country_id: query.country_id,
        numbers,
    }]))
}

/// Rent a phone number
///
/// GET /api/control/get-number
#[instrument(skip(pool, pricing, lifecycle, token))]
pub async fn get_number(
    pool: web::Data<PgPool>,
    pricing: web::Data<AppPricing>,
    lifecycle: web::Data<AppLifecycle>,
    token: ApiToken,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, AppError> {
    let user = resolve_user(pool.get_ref(), &token).await?;

    let catalog = PgCatalogRepository::new(pool.get_ref().clone());
    let country = catalog
        .find_active_country(query.country_id)
        .await?
        .ok_or_else(|| AppError::ServiceUnavailable(format!("country {}", query.country_id)))?;
    let application = catalog
        .find_active_application(query.application_id)
        .await?
        .ok_or_else(|| {
            AppError::ServiceUnavailable(format!("application {}", query.application_id))
        })?;

    let price = pricing
        .get_price(query.country_id, query.application_id)
        .await?
        .ok_or_else(|| {
            AppError::ServiceUnavailable(format!(
                "no price for country {} application {}",
                query.country_id, query.application_id
            ))
        })?;

    let request = lifecycle
        .create_request(&user, &country, &application, &price)
        .await?;

    info!(
        "User {} rented {} for request {}",
        user.id, request.phone_number, request.request_id
    );

    Ok(HttpResponse::Ok().json(NumberResponse::from(&request)))
}

/// Poll for the verification SMS
///
/// GET /api/control/get-sms
#[instrument(skip(pool, lifecycle, token))]
pub async fn get_sms(
    pool: web::Data<PgPool>,
    lifecycle: web::Data<AppLifecycle>,
    token: ApiToken,
    query: web::Query<RequestQuery>,
) -> Result<HttpResponse, AppError> {
    let user = resolve_user(pool.get_ref(), &token).await?;

    let (request, _history) = lifecycle.poll_sms(user.id, &query.request_id).await?;

    Ok(HttpResponse::Ok().json(SmsResponse::from(&request)))
}

/// Change the status of a request
///
/// POST /api/control/set-status
#[instrument(skip(pool, lifecycle, token))]
pub async fn set_status(
    pool: web::Data<PgPool>,
    lifecycle: web::Data<AppLifecycle>,
    token: ApiToken,
    query: web::Query<SetStatusQuery>,
) -> Result<HttpResponse, AppError> {
    let user = resolve_user(pool.get_ref(), &token).await?;

    let next = RequestStatus::from_str(&query.status).ok_or_else(|| {
        warn!("Invalid status '{}' requested", query.status);
        AppError::InvalidParameter(format!(
            "Invalid status '{}'. Must be one of: ready, close, reject, used",
            query.status
        ))
    })?;

    let request = lifecycle
        .set_status(user.id, &query.request_id, next)
        .await?;

    Ok(HttpResponse::Ok().json(SetStatusResponse {
        request_id: request.request_id,
        success: true,
    }))
}

/// Get the price table for one country
///
/// GET /api/control/get-prices
#[instrument(skip(pool, pricing, token))]
pub async fn get_prices(
    pool: web::Data<PgPool>,
    pricing: web::Data<AppPricing>,
    token: ApiToken,
    query: web::Query<CountryQuery>,
) -> Result<HttpResponse, AppError> {
    resolve_user(pool.get_ref(), &token).await?;

    let entries = pricing.list_by_country(query.country_id).await?;
    Ok(HttpResponse::Ok().json(price_map(&entries)))
}

/// List available countries
///
/// GET /api/control/countries
#[instrument(skip(pool, token))]
pub async fn countries(
    pool: web::Data<PgPool>,
    token: ApiToken,
) -> Result<HttpResponse, AppError> {
    resolve_user(pool.get_ref(), &token).await?;

    let catalog = PgCatalogRepository::new(pool.get_ref().clone());
    let countries = catalog.active_countries().await?;
    let items: Vec<CountryItem> = countries.iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(items))
}

/// List available applications
///
/// GET /api/control/applications
#[instrument(skip(pool, token))]
pub async fn applications(
    pool: web::Data<PgPool>,
    token: ApiToken,
) -> Result<HttpResponse, AppError> {
    resolve_user(pool.get_ref(), &token).await?;

    let catalog = PgCatalogRepository::new(pool.get_ref().clone());
    let applications = catalog.active_applications().await?;
    let items: Vec<ApplicationItem> = applications.iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(items))
}

/// Register the control facade routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/get-balance", web::get().to(get_balance))
        .route("/limits", web::get().to(limits))
        .route("/get-number", web::get().to(get_number))
        .route("/get-sms", web::get().to(get_sms))
        .route("/set-status", web::post().to(set_status))
        .route("/get-prices", web::get().to(get_prices))
        .route("/countries", web::get().to(countries))
        .route("/applications", web::get().to(applications));
}
