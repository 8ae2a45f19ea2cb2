//! Number request repository implementation
//!
//! Read side and maintenance for number requests. The status-changing paths
//! (charging, SMS delivery, set-status) live in the lifecycle service, which
//! runs them inside transactions with row locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use numio_core::{
    models::{NumberRequest, RequestStatus, SmsMessage},
    traits::RequestRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

const REQUEST_COLUMNS: &str = r#"
    request_id, user_id, country_id, application_id, phone_number,
    status, cost, currency, sms_code, expires_at, received_at,
    completed_at, created_at, updated_at
"#;

/// PostgreSQL implementation of RequestRepository
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    ///
    /// Unknown values map to `expired` so a corrupt row can never look open.
    fn parse_status(s: &str) -> RequestStatus {
        RequestStatus::from_str(s).unwrap_or(RequestStatus::Expired)
    }
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    #[instrument(skip(self))]
    async fn find_by_request_id(&self, request_id: &str) -> AppResult<Option<NumberRequest>> {
        debug!("Finding request: {}", request_id);

        let row = sqlx::query_as::<sqlx::Postgres, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM number_requests
            WHERE request_id = $1
            "#,
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding request {}: {}", request_id, e);
            AppError::Database(format!("Failed to find request: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_for_user(
        &self,
        request_id: &str,
        user_id: i32,
    ) -> AppResult<Option<NumberRequest>> {
        debug!("Finding request {} for user {}", request_id, user_id);

        let row = sqlx::query_as::<sqlx::Postgres, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM number_requests
            WHERE request_id = $1 AND user_id = $2
            "#,
        ))
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding request {}: {}", request_id, e);
            AppError::Database(format!("Failed to find request: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn sms_history(&self, request_id: &str) -> AppResult<Vec<SmsMessage>> {
        debug!("Fetching SMS history for request {}", request_id);

        let rows = sqlx::query_as::<sqlx::Postgres, SmsRow>(
            r#"
            SELECT message, received_at
            FROM request_sms
            WHERE request_id = $1
            ORDER BY received_at ASC, id ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error fetching SMS for {}: {}", request_id, e);
            AppError::Database(format!("Failed to fetch SMS history: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Single-statement sweep: every open request past its deadline flips to
    /// `expired`. Running it twice for the same instant is a no-op.
    #[instrument(skip(self))]
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE number_requests
            SET status = 'expired', updated_at = NOW()
            WHERE status IN ('ready', 'close')
              AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error sweeping expired requests: {}", e);
            AppError::Database(format!("Failed to sweep expired requests: {}", e))
        })?;

        let swept = result.rows_affected();
        if swept > 0 {
            info!("Expired {} overdue requests", swept);
        }
        Ok(swept)
    }
}

/// Database row for number requests
#[derive(sqlx::FromRow)]
struct RequestRow {
    request_id: String,
    user_id: i32,
    country_id: i32,
    application_id: i32,
    phone_number: String,
    status: String,
    cost: Decimal,
    currency: String,
    sms_code: Option<String>,
    expires_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RequestRow> for NumberRequest {
    fn from(row: RequestRow) -> Self {
        Self {
            request_id: row.request_id,
            user_id: row.user_id,
            country_id: row.country_id,
            application_id: row.application_id,
            phone_number: row.phone_number,
            status: PgRequestRepository::parse_status(&row.status),
            cost: row.cost,
            currency: row.currency,
            sms_code: row.sms_code,
            expires_at: row.expires_at,
            received_at: row.received_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for received SMS messages
#[derive(sqlx::FromRow)]
struct SmsRow {
    message: String,
    received_at: DateTime<Utc>,
}

impl From<SmsRow> for SmsMessage {
    fn from(row: SmsRow) -> Self {
        Self {
            message: row.message,
            received_at: row.received_at,
        }
    }
}
