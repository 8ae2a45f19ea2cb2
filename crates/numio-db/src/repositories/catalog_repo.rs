//! Country and application catalog repository implementation
//!
//! Read-mostly storage for the catalog. Active filtering is strictly boolean
//! (`is_active = TRUE`); listings sort by priority descending, then name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use numio_core::{
    models::{AppCategory, Application, Country},
    traits::CatalogRepository,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of CatalogRepository
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database category string to enum
    fn parse_category(s: &str) -> AppCategory {
        AppCategory::from_str(s).unwrap_or(AppCategory::Other)
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn active_countries(&self) -> AppResult<Vec<Country>> {
        debug!("Listing active countries");

        let rows = sqlx::query_as::<sqlx::Postgres, CountryRow>(
            r#"
            SELECT
                id, title, code, phone_code, flag, currency,
                is_active, priority, created_at, updated_at
            FROM countries
            WHERE is_active = TRUE
            ORDER BY priority DESC, title ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing countries: {}", e);
            AppError::Database(format!("Failed to fetch countries: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn active_applications(&self) -> AppResult<Vec<Application>> {
        debug!("Listing active applications");

        let rows = sqlx::query_as::<sqlx::Postgres, ApplicationRow>(
            r#"
            SELECT
                id, name, code, category, icon,
                is_active, priority, created_at, updated_at
            FROM applications
            WHERE is_active = TRUE
            ORDER BY priority DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing applications: {}", e);
            AppError::Database(format!("Failed to fetch applications: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_active_country(&self, id: i32) -> AppResult<Option<Country>> {
        debug!("Finding active country: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, CountryRow>(
            r#"
            SELECT
                id, title, code, phone_code, flag, currency,
                is_active, priority, created_at, updated_at
            FROM countries
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding country {}: {}", id, e);
            AppError::Database(format!("Failed to find country: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_active_application(&self, id: i32) -> AppResult<Option<Application>> {
        debug!("Finding active application: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, ApplicationRow>(
            r#"
            SELECT
                id, name, code, category, icon,
                is_active, priority, created_at, updated_at
            FROM applications
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding application {}: {}", id, e);
            AppError::Database(format!("Failed to find application: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}

/// Database row for countries
#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i32,
    title: String,
    code: String,
    phone_code: String,
    flag: Option<String>,
    currency: String,
    is_active: bool,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            code: row.code,
            phone_code: row.phone_code,
            flag: row.flag,
            currency: row.currency,
            is_active: row.is_active,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for applications
#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: i32,
    name: String,
    code: String,
    category: String,
    icon: Option<String>,
    is_active: bool,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            category: PgCatalogRepository::parse_category(&row.category),
            icon: row.icon,
            is_active: row.is_active,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(
            PgCatalogRepository::parse_category("messaging"),
            AppCategory::Messaging
        );
        assert_eq!(
            PgCatalogRepository::parse_category("garbage"),
            AppCategory::Other
        );
    }
}
