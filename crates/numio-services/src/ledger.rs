//! Balance ledger service
//!
//! All balance movement goes through here. Every change appends one immutable
//! row to `balance_transactions`; the user's `balance` column is only ever
//! updated in the same transaction as its ledger row.
//!
//! - Credits are idempotent: the external payment reference is unique, and
//!   the ledger row is inserted before the balance moves, so a replayed
//!   payment fails on the constraint without touching the balance.
//! - Debits are conditional: a single `UPDATE ... WHERE balance >= amount`
//!   either charges in full or not at all, even under concurrency.

use async_trait::async_trait;
use numio_core::{
    models::{BalanceTransaction, PaymentMethod, TransactionKind},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Storage behind the ledger
///
/// One call is one atomic balance movement together with its ledger row.
/// Implementations must reject a replayed `external_ref` with
/// `DuplicatePayment` and an overdraw with `InsufficientBalance`, in both
/// cases leaving the balance untouched.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Apply a credit and append its ledger row
    async fn record_credit(
        &self,
        user_id: i32,
        amount: Decimal,
        method: PaymentMethod,
        external_ref: &str,
    ) -> AppResult<BalanceTransaction>;

    /// Apply a debit and append its ledger row
    async fn record_debit(
        &self,
        user_id: i32,
        amount: Decimal,
        request_id: Option<&str>,
    ) -> AppResult<BalanceTransaction>;
}

/// Ledger service
///
/// Validates amounts and references, then delegates the atomic movement to
/// the store.
pub struct LedgerService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Create a new ledger service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Credit a user's balance from an external payment
    ///
    /// Idempotent on `external_ref`: replaying the same payment reference
    /// returns `AppError::DuplicatePayment` and leaves the balance untouched.
    #[instrument(skip(self))]
    pub async fn credit(
        &self,
        user_id: i32,
        amount: Decimal,
        method: PaymentMethod,
        external_ref: &str,
    ) -> AppResult<BalanceTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidParameter(format!(
                "Credit amount must be positive, got {}",
                amount
            )));
        }
        if external_ref.is_empty() {
            return Err(AppError::MissingField("external_ref".to_string()));
        }

        let record = self
            .store
            .record_credit(user_id, amount, method, external_ref)
            .await?;

        info!(
            "Credited user {} with {} ({})",
            user_id, amount, external_ref
        );
        Ok(record)
    }

    /// Debit a user's balance for a purchase
    #[instrument(skip(self))]
    pub async fn debit(
        &self,
        user_id: i32,
        amount: Decimal,
        request_id: Option<&str>,
    ) -> AppResult<BalanceTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidParameter(format!(
                "Debit amount must be positive, got {}",
                amount
            )));
        }

        let record = self.store.record_debit(user_id, amount, request_id).await?;

        info!("Debited user {} by {}", user_id, amount);
        Ok(record)
    }
}

/// Postgres-backed ledger store
pub struct PgLedgerStore {
    pool: Arc<PgPool>,
}

impl PgLedgerStore {
    /// Create a new Postgres ledger store
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Debit inside an existing transaction
    ///
    /// The conditional `UPDATE` is the atomicity point: it succeeds only if
    /// the user is active and holds at least `amount`, so two concurrent
    /// purchases can never overdraw the balance.
    pub async fn debit_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        amount: Decimal,
        request_id: Option<&str>,
    ) -> AppResult<BalanceTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidParameter(format!(
                "Debit amount must be positive, got {}",
                amount
            )));
        }

        let new_balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET balance = balance - $2, updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            error!("Failed to debit user {}: {}", user_id, e);
            AppError::Database(format!("Failed to debit user: {}", e))
        })?;

        let new_balance = match new_balance {
            Some(balance) => balance,
            None => {
                // Distinguish an unknown user from one who cannot afford it
                let available: Option<Decimal> = sqlx::query_scalar(
                    "SELECT balance FROM users WHERE id = $1 AND is_active = TRUE",
                )
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| {
                    error!("Failed to read balance for user {}: {}", user_id, e);
                    AppError::Database(format!("Failed to read balance: {}", e))
                })?;

                return match available {
                    Some(available) => {
                        warn!(
                            "Insufficient balance for user {}: required {}, available {}",
                            user_id, amount, available
                        );
                        Err(AppError::InsufficientBalance {
                            required: amount.to_string(),
                            available: available.to_string(),
                        })
                    }
                    None => Err(AppError::UserNotFound(user_id.to_string())),
                };
            }
        };

        let record: LedgerRow = sqlx::query_as(
            r#"
            INSERT INTO balance_transactions (
                user_id, amount, previous_balance, new_balance,
                kind, request_id
            )
            VALUES ($1, $2, $3, $4, 'purchase', $5)
            RETURNING id, created_at
            "#,
        )
        .bind(user_id)
        .bind(-amount)
        .bind(new_balance + amount)
        .bind(new_balance)
        .bind(request_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            error!("Failed to record debit: {}", e);
            AppError::Database(format!("Failed to record debit: {}", e))
        })?;

        Ok(BalanceTransaction {
            id: record.id,
            user_id,
            amount: -amount,
            previous_balance: new_balance + amount,
            new_balance,
            kind: TransactionKind::Purchase,
            method: None,
            external_ref: None,
            request_id: request_id.map(ToString::to_string),
            created_at: record.created_at,
        })
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn record_credit(
        &self,
        user_id: i32,
        amount: Decimal,
        method: PaymentMethod,
        external_ref: &str,
    ) -> AppResult<BalanceTransaction> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // Lock the user row so previous/new balances are consistent
        let previous: Decimal = sqlx::query_scalar(
            r#"
            SELECT balance FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to lock user {}: {}", user_id, e);
            AppError::Database(format!("Failed to lock user: {}", e))
        })?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        // Ledger row goes in first: the unique constraint on external_ref is
        // what rejects a replayed payment before any balance change.
        let record: LedgerRow = sqlx::query_as(
            r#"
            INSERT INTO balance_transactions (
                user_id, amount, previous_balance, new_balance,
                kind, method, external_ref
            )
            VALUES ($1, $2, $3, $4, 'payment', $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(previous)
        .bind(previous + amount)
        .bind(method.to_string())
        .bind(external_ref)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db) = e {
                if db.is_unique_violation() {
                    warn!(
                        "Duplicate payment reference {} for user {}",
                        external_ref, user_id
                    );
                    return AppError::DuplicatePayment(external_ref.to_string());
                }
            }
            error!("Failed to record credit: {}", e);
            AppError::Database(format!("Failed to record credit: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE users
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to apply credit: {}", e);
            AppError::Database(format!("Failed to apply credit: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit credit: {}", e);
            AppError::Transaction(format!("Failed to commit credit: {}", e))
        })?;

        Ok(BalanceTransaction {
            id: record.id,
            user_id,
            amount,
            previous_balance: previous,
            new_balance: previous + amount,
            kind: TransactionKind::Payment,
            method: Some(method),
            external_ref: Some(external_ref.to_string()),
            request_id: None,
            created_at: record.created_at,
        })
    }

    async fn record_debit(
        &self,
        user_id: i32,
        amount: Decimal,
        request_id: Option<&str>,
    ) -> AppResult<BalanceTransaction> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let record = Self::debit_in_tx(&mut tx, user_id, amount, request_id).await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit debit: {}", e);
            AppError::Transaction(format!("Failed to commit debit: {}", e))
        })?;

        Ok(record)
    }
}

/// Returned columns of a freshly inserted ledger row
#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};

    /// In-memory store mirroring the unique external_ref constraint and the
    /// non-overdraw rule
    #[derive(Default)]
    struct MemoryLedgerStore {
        balances: Mutex<HashMap<i32, Decimal>>,
        refs: Mutex<HashSet<String>>,
        rows: Mutex<Vec<BalanceTransaction>>,
    }

    impl MemoryLedgerStore {
        fn with_user(user_id: i32, balance: Decimal) -> Self {
            let store = Self::default();
            store.balances.lock().insert(user_id, balance);
            store
        }

        fn balance(&self, user_id: i32) -> Decimal {
            *self.balances.lock().get(&user_id).unwrap()
        }

        fn push_row(
            &self,
            user_id: i32,
            amount: Decimal,
            previous: Decimal,
            kind: TransactionKind,
            method: Option<PaymentMethod>,
            external_ref: Option<&str>,
            request_id: Option<&str>,
        ) -> BalanceTransaction {
            let mut rows = self.rows.lock();
            let record = BalanceTransaction {
                id: rows.len() as i64 + 1,
                user_id,
                amount,
                previous_balance: previous,
                new_balance: previous + amount,
                kind,
                method,
                external_ref: external_ref.map(ToString::to_string),
                request_id: request_id.map(ToString::to_string),
                created_at: Utc::now(),
            };
            rows.push(record.clone());
            record
        }
    }

    #[async_trait]
    impl LedgerStore for MemoryLedgerStore {
        async fn record_credit(
            &self,
            user_id: i32,
            amount: Decimal,
            method: PaymentMethod,
            external_ref: &str,
        ) -> AppResult<BalanceTransaction> {
            let previous = *self
                .balances
                .lock()
                .get(&user_id)
                .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

            if !self.refs.lock().insert(external_ref.to_string()) {
                return Err(AppError::DuplicatePayment(external_ref.to_string()));
            }

            self.balances.lock().insert(user_id, previous + amount);
            Ok(self.push_row(
                user_id,
                amount,
                previous,
                TransactionKind::Payment,
                Some(method),
                Some(external_ref),
                None,
            ))
        }

        async fn record_debit(
            &self,
            user_id: i32,
            amount: Decimal,
            request_id: Option<&str>,
        ) -> AppResult<BalanceTransaction> {
            let previous = *self
                .balances
                .lock()
                .get(&user_id)
                .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

            if previous < amount {
                return Err(AppError::InsufficientBalance {
                    required: amount.to_string(),
                    available: previous.to_string(),
                });
            }

            self.balances.lock().insert(user_id, previous - amount);
            Ok(self.push_row(
                user_id,
                -amount,
                previous,
                TransactionKind::Purchase,
                None,
                None,
                request_id,
            ))
        }
    }

    fn service_with_balance(
        balance: Decimal,
    ) -> (Arc<MemoryLedgerStore>, LedgerService<MemoryLedgerStore>) {
        let store = Arc::new(MemoryLedgerStore::with_user(1, balance));
        (store.clone(), LedgerService::new(store))
    }

    #[tokio::test]
    async fn test_duplicate_credit_leaves_balance_untouched() {
        let (store, ledger) = service_with_balance(dec!(0));

        let credit = ledger
            .credit(1, dec!(25.00), PaymentMethod::Card, "pay-1")
            .await
            .unwrap();
        assert_eq!(credit.new_balance, dec!(25.00));

        let replay = ledger
            .credit(1, dec!(25.00), PaymentMethod::Card, "pay-1")
            .await;
        assert!(matches!(replay, Err(AppError::DuplicatePayment(_))));
        assert_eq!(store.balance(1), dec!(25.00));
        assert_eq!(store.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_second_debit_cannot_overdraw() {
        let (store, ledger) = service_with_balance(dec!(10.00));

        let first = ledger.debit(1, dec!(7.00), Some("req-a")).await.unwrap();
        assert_eq!(first.new_balance, dec!(3.00));

        let second = ledger.debit(1, dec!(7.00), Some("req-b")).await;
        assert!(matches!(
            second,
            Err(AppError::InsufficientBalance { .. })
        ));
        assert_eq!(store.balance(1), dec!(3.00));

        // An exact-balance debit still goes through
        let third = ledger.debit(1, dec!(3.00), None).await.unwrap();
        assert_eq!(third.new_balance, dec!(0.00));
    }

    #[tokio::test]
    async fn test_ledger_rows_sum_to_balance() {
        let (store, ledger) = service_with_balance(dec!(0));

        ledger
            .credit(1, dec!(20.00), PaymentMethod::Paypal, "pay-a")
            .await
            .unwrap();
        ledger
            .credit(1, dec!(5.50), PaymentMethod::Card, "pay-b")
            .await
            .unwrap();
        ledger.debit(1, dec!(0.30), Some("req-1")).await.unwrap();

        let sum: Decimal = store.rows.lock().iter().map(|r| r.amount).sum();
        assert_eq!(sum, store.balance(1));
    }

    #[tokio::test]
    async fn test_credit_unknown_user() {
        let (_, ledger) = service_with_balance(dec!(0));

        let result = ledger.credit(9, dec!(5.00), PaymentMethod::Card, "pay-x").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_credit_rejects_non_positive_amount() {
        // Validation fires before any store access
        let (store, ledger) = service_with_balance(dec!(0));

        let result = ledger.credit(1, dec!(0), PaymentMethod::Card, "ref-1").await;
        assert!(matches!(result, Err(AppError::InvalidParameter(_))));

        let result = ledger.credit(1, dec!(-5), PaymentMethod::Card, "ref-2").await;
        assert!(matches!(result, Err(AppError::InvalidParameter(_))));
        assert!(store.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_credit_requires_external_ref() {
        let (_, ledger) = service_with_balance(dec!(0));

        let result = ledger.credit(1, dec!(10), PaymentMethod::Card, "").await;
        assert!(matches!(result, Err(AppError::MissingField(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_credit_and_debit_round_trip() {
        let pool = Arc::new(
            numio_db::create_pool(
                &std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/numio".to_string()),
                Some(5),
            )
            .await
            .unwrap(),
        );
        let ledger = LedgerService::new(Arc::new(PgLedgerStore::new(pool)));

        let credit = ledger
            .credit(1, dec!(25.00), PaymentMethod::Card, "pay-test-1")
            .await
            .unwrap();
        assert_eq!(credit.new_balance, credit.previous_balance + dec!(25.00));

        // Replay is rejected without moving the balance
        let replay = ledger
            .credit(1, dec!(25.00), PaymentMethod::Card, "pay-test-1")
            .await;
        assert!(matches!(replay, Err(AppError::DuplicatePayment(_))));
    }
}
