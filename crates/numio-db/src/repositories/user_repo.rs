//! API user repository implementation
//!
//! Balance is never written here; all balance mutations go through the
//! ledger service inside a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use numio_core::{models::ApiUser, traits::UserRepository, AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<ApiUser>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(
            r#"
            SELECT
                id, email, api_key, balance, currency,
                is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user {}: {}", id, e);
            AppError::Database(format!("Failed to find user: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, api_key))]
    async fn find_by_api_key(&self, api_key: &str) -> AppResult<Option<ApiUser>> {
        debug!("Finding user by API key");

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(
            r#"
            SELECT
                id, email, api_key, balance, currency,
                is_active, created_at, updated_at
            FROM users
            WHERE api_key = $1 AND is_active = TRUE
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user by API key: {}", e);
            AppError::Database(format!("Failed to find user: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}

/// Database row for API users
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    api_key: String,
    balance: Decimal,
    currency: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for ApiUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            api_key: row.api_key,
            balance: row.balance,
            currency: row.currency,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
