//! Numio server
//!
//! SMS-verification number rental backend. One process serves the
//! API-key-authenticated control facade and the JWT-authenticated admin API,
//! and runs the background expiry sweeper.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use numio_api::{
    configure_auth, configure_control, configure_payments, configure_prices, configure_requests,
    AppLedger, AppLifecycle, AppPricing, AppSweeper,
};
use numio_auth::{JwtService, PasswordService};
use numio_cache::RedisCache;
use numio_core::config::AppConfig;
use numio_db::{create_pool, PgPriceRepository, PgRequestRepository};
use numio_services::{LedgerService, LocalNumberPool, PgLedgerStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "numio",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "numio={},numio_api={},numio_services={},numio_db={},actix_web=info,sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting Numio v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Auth services
    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    let password_service = Arc::new(PasswordService::new());

    info!(
        "JWT service configured with {} second token expiration",
        config.auth.jwt_expiration_secs
    );

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .expect("Failed to create database pool");

    info!(
        "Database connection established with {} max connections",
        config.database.max_connections
    );

    info!("Connecting to Redis...");
    let cache = Arc::new(
        RedisCache::new(&config.redis.url)
            .await
            .expect("Failed to connect to Redis"),
    );

    // Domain services
    let shared_pool = Arc::new(pool.clone());
    let pricing: Arc<AppPricing> = Arc::new(numio_services::PricingService::new(
        Arc::new(PgPriceRepository::new(pool.clone())),
        cache.clone(),
        config.rental.price_cache_ttl_secs,
    ));
    let ledger: Arc<AppLedger> = Arc::new(LedgerService::new(Arc::new(PgLedgerStore::new(
        shared_pool.clone(),
    ))));
    let lifecycle: Arc<AppLifecycle> = Arc::new(numio_services::LifecycleService::new(
        shared_pool.clone(),
        Arc::new(LocalNumberPool::new(config.rental.subscriber_digits)),
        config.rental.ttl_minutes,
        config.rental.provider_timeout_secs,
    ));

    // Background expiry sweeper; shares the same instance with the admin API
    let sweeper: Arc<AppSweeper> = Arc::new(numio_services::ExpirySweeper::new(
        Arc::new(PgRequestRepository::new(pool.clone())),
        config.rental.sweep_interval_secs,
    ));
    let _sweeper_handle = sweeper.clone().spawn();

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    let jwt_service_clone = jwt_service.clone();
    let password_service_clone = password_service.clone();

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service_clone.clone()))
            .app_data(web::Data::new(password_service_clone.clone()))
            .app_data(web::Data::from(pricing.clone()))
            .app_data(web::Data::from(ledger.clone()))
            .app_data(web::Data::from(lifecycle.clone()))
            .app_data(web::Data::from(sweeper.clone()))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::NormalizePath::trim())
            // Client-facing control facade
            .service(web::scope("/api/control").configure(configure_control))
            // Admin API
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health_check))
                    .configure(configure_auth)
                    .configure(configure_prices)
                    .configure(configure_payments)
                    .configure(configure_requests),
            )
            // Root redirect to health
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
