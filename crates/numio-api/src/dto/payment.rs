//! Payment DTOs

use chrono::{DateTime, Utc};
use numio_core::models::BalanceTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// POST /admin/payments request body
///
/// `external_ref` is the payment provider's reference and makes the credit
/// idempotent: replaying the same reference is rejected.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,

    /// Amount to credit; must be positive
    pub amount: Decimal,

    /// Payment method: card, paypal, crypto, or manual
    #[validate(length(min = 1))]
    pub method: String,

    /// External payment reference, unique per payment
    #[validate(length(min = 1, max = 128))]
    pub external_ref: String,
}

/// Ledger transaction as exposed to admins
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub user_id: i32,
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub kind: String,
    pub external_ref: Option<String>,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BalanceTransaction> for TransactionResponse {
    fn from(tx: BalanceTransaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            amount: tx.amount,
            previous_balance: tx.previous_balance,
            new_balance: tx.new_balance,
            kind: tx.kind.to_string(),
            external_ref: tx.external_ref,
            request_id: tx.request_id,
            created_at: tx.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_request_validation() {
        let valid = PaymentRequest {
            user_id: 1,
            amount: dec!(25.00),
            method: "card".to_string(),
            external_ref: "pay-123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let missing_ref = PaymentRequest {
            external_ref: String::new(),
            ..valid
        };
        assert!(missing_ref.validate().is_err());
    }
}
