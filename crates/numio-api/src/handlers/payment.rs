//! Payment handlers
//!
//! Admin-driven balance credits. In production the payment provider webhook
//! terminates here; the `external_ref` it carries is what makes retries safe.

use crate::dto::payment::{PaymentRequest, TransactionResponse};
use crate::dto::ApiResponse;
use crate::AppLedger;
use actix_web::{web, HttpResponse};
use numio_auth::AdminUser;
use numio_core::models::PaymentMethod;
use numio_core::AppError;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Credit a user's balance
///
/// POST /api/v1/payments
#[instrument(skip(ledger, admin, req))]
pub async fn create_payment(
    ledger: web::Data<AppLedger>,
    admin: AdminUser,
    req: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let method = PaymentMethod::from_str(&req.method).ok_or_else(|| {
        AppError::InvalidParameter(format!(
            "Invalid payment method '{}'. Must be one of: card, paypal, crypto, manual",
            req.method
        ))
    })?;

    let tx = ledger
        .credit(req.user_id, req.amount, method, &req.external_ref)
        .await?;

    info!(
        "Admin {} credited user {} with {} ({})",
        admin.username, req.user_id, req.amount, req.external_ref
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(TransactionResponse::from(tx))))
}

/// Register payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/payments").route("", web::post().to(create_payment)));
}
