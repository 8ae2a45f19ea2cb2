//! Admin request handlers
//!
//! Operational surface for rentals: inspect a request with its SMS history,
//! inject an inbound SMS (carrier webhook), and force an expiry sweep.

use crate::dto::request::{DeliverSmsRequest, RequestDetailResponse, SweepResponse};
use crate::dto::ApiResponse;
use crate::{AppLifecycle, AppSweeper};
use actix_web::{web, HttpResponse};
use numio_auth::AdminUser;
use numio_core::traits::RequestRepository;
use numio_core::AppError;
use numio_db::PgRequestRepository;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Inspect a request and its SMS history
///
/// GET /api/v1/requests/{request_id}
#[instrument(skip(pool, _admin))]
pub async fn get_request(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();

    let repo = PgRequestRepository::new(pool.get_ref().clone());
    let request = repo
        .find_by_request_id(&request_id)
        .await?
        .ok_or_else(|| AppError::RequestNotFound(request_id.clone()))?;
    let history = repo.sms_history(&request_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(RequestDetailResponse::new(
        request, history,
    ))))
}

/// Deliver an inbound SMS to a request
///
/// POST /api/v1/requests/{request_id}/sms
#[instrument(skip(pool, lifecycle, admin, req))]
pub async fn deliver_sms(
    pool: web::Data<PgPool>,
    lifecycle: web::Data<AppLifecycle>,
    path: web::Path<String>,
    admin: AdminUser,
    req: web::Json<DeliverSmsRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("SMS delivery validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let request_id = path.into_inner();
    let request = lifecycle.deliver_sms(&request_id, &req.message).await?;

    let repo = PgRequestRepository::new(pool.get_ref().clone());
    let history = repo.sms_history(&request_id).await?;

    info!(
        "Admin {} delivered SMS to request {}",
        admin.username, request_id
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(RequestDetailResponse::new(
        request, history,
    ))))
}

/// Force an expiry sweep outside the periodic schedule
///
/// POST /api/v1/requests/sweep
#[instrument(skip(sweeper, admin))]
pub async fn sweep(
    sweeper: web::Data<AppSweeper>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let expired = sweeper.run_once().await?;

    info!("Admin {} swept {} expired requests", admin.username, expired);

    Ok(HttpResponse::Ok().json(ApiResponse::success(SweepResponse { expired })))
}

/// Register admin request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/requests")
            .route("/sweep", web::post().to(sweep))
            .route("/{request_id}", web::get().to(get_request))
            .route("/{request_id}/sms", web::post().to(deliver_sms)),
    );
}
