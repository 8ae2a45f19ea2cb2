//! Admin price management handlers

use crate::dto::price::{PriceEntryResponse, PriceUpsertRequest, QuoteQuery, QuoteResponse};
use crate::dto::ApiResponse;
use crate::AppPricing;
use actix_web::{web, HttpResponse};
use numio_auth::{AdminUser, AuthenticatedUser};
use numio_core::AppError;
use tracing::{info, instrument, warn};
use validator::Validate;

/// List prices for a country
///
/// GET /api/v1/prices/{country_id}
#[instrument(skip(pricing, _user))]
pub async fn list_prices(
    pricing: web::Data<AppPricing>,
    path: web::Path<i32>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let country_id = path.into_inner();
    let entries = pricing.list_by_country(country_id).await?;

    let response: Vec<PriceEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Quote the final unit price for a quantity
///
/// GET /api/v1/prices/quote
#[instrument(skip(pricing, _user))]
pub async fn quote(
    pricing: web::Data<AppPricing>,
    query: web::Query<QuoteQuery>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Quote validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let unit_price = pricing
        .quote(query.country_id, query.application_id, query.quantity)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(QuoteResponse {
        country_id: query.country_id,
        application_id: query.application_id,
        quantity: query.quantity,
        unit_price,
    })))
}

/// Create or overwrite a price entry
///
/// PUT /api/v1/prices
#[instrument(skip(pricing, admin, req))]
pub async fn upsert_price(
    pricing: web::Data<AppPricing>,
    admin: AdminUser,
    req: web::Json<PriceUpsertRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Price upsert validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let entry = pricing
        .upsert_price(req.country_id, req.application_id, req.cost, &admin.username)
        .await?;

    info!(
        "Admin {} set price ({}, {}) to {}",
        admin.username, req.country_id, req.application_id, req.cost
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(PriceEntryResponse::from(entry))))
}

/// Register price management routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/prices")
            .route("/quote", web::get().to(quote))
            .route("/{country_id}", web::get().to(list_prices))
            .route("", web::put().to(upsert_price)),
    );
}
