//! API user and balance ledger models
//!
//! Balances are only ever changed through ledger operations; every change
//! appends one immutable `BalanceTransaction` row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role for the admin API (JWT-authenticated surface)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Read-mostly operator access
    #[default]
    Operator,
    /// Full administrative access (price management, SMS injection)
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Operator => write!(f, "operator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "operator" => Some(UserRole::Operator),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Check for administrative privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// API user entity
///
/// A customer of the control facade, authenticated by API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    /// Unique identifier
    pub id: i32,

    /// Contact e-mail
    pub email: String,

    /// Bearer API key for the control facade
    pub api_key: String,

    /// Current balance
    pub balance: Decimal,

    /// Currency code (ISO 4217)
    pub currency: String,

    /// Whether the user may call the facade
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ApiUser {
    /// Check whether this user can afford `amount`
    #[inline]
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.is_active && self.balance >= amount
    }
}

impl Default for ApiUser {
    fn default() -> Self {
        Self {
            id: 0,
            email: String::new(),
            api_key: String::new(),
            balance: Decimal::ZERO,
            currency: "USD".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Ledger transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Debit for a number rental
    Purchase,
    /// Credit from an external payment
    Payment,
    /// Credit returning a previous debit
    Refund,
    /// Manual balance adjustment
    Adjustment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Purchase => write!(f, "purchase"),
            TransactionKind::Payment => write!(f, "payment"),
            TransactionKind::Refund => write!(f, "refund"),
            TransactionKind::Adjustment => write!(f, "adjustment"),
        }
    }
}

impl TransactionKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "purchase" => Some(TransactionKind::Purchase),
            "payment" => Some(TransactionKind::Payment),
            "refund" => Some(TransactionKind::Refund),
            "adjustment" => Some(TransactionKind::Adjustment),
            _ => None,
        }
    }
}

/// Payment method recorded on credit transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Paypal,
    Crypto,
    Manual,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Paypal => write!(f, "paypal"),
            PaymentMethod::Crypto => write!(f, "crypto"),
            PaymentMethod::Manual => write!(f, "manual"),
        }
    }
}

impl PaymentMethod {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "card" => Some(PaymentMethod::Card),
            "paypal" => Some(PaymentMethod::Paypal),
            "crypto" => Some(PaymentMethod::Crypto),
            "manual" => Some(PaymentMethod::Manual),
            _ => None,
        }
    }
}

/// Balance transaction entity
///
/// Immutable audit log of all balance changes. `external_ref` carries the
/// payment-provider reference on credits and is unique, which is what makes
/// `credit` idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTransaction {
    /// Unique identifier
    pub id: i64,

    /// Owning user
    pub user_id: i32,

    /// Signed amount (negative = debit)
    pub amount: Decimal,

    /// Balance before this transaction
    pub previous_balance: Decimal,

    /// Balance after this transaction
    pub new_balance: Decimal,

    /// Transaction kind
    pub kind: TransactionKind,

    /// Payment method, for credits
    pub method: Option<PaymentMethod>,

    /// External payment reference (unique where present)
    pub external_ref: Option<String>,

    /// Associated number request, for purchases/refunds
    pub request_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl BalanceTransaction {
    /// Create a new transaction record
    pub fn new(
        user_id: i32,
        amount: Decimal,
        previous_balance: Decimal,
        kind: TransactionKind,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            amount,
            previous_balance,
            new_balance: previous_balance + amount,
            kind,
            method: None,
            external_ref: None,
            request_id: None,
            created_at: Utc::now(),
        }
    }

    /// Check if this is a debit transaction (reduces balance)
    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Check if this is a credit transaction (increases balance)
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_can_afford() {
        let user = ApiUser {
            balance: dec!(1.00),
            ..Default::default()
        };
        assert!(user.can_afford(dec!(0.30)));
        assert!(user.can_afford(dec!(1.00)));
        assert!(!user.can_afford(dec!(1.01)));
    }

    #[test]
    fn test_inactive_user_cannot_afford() {
        let user = ApiUser {
            balance: dec!(100.00),
            is_active: false,
            ..Default::default()
        };
        assert!(!user.can_afford(dec!(0.01)));
    }

    #[test]
    fn test_transaction_balances() {
        let tx = BalanceTransaction::new(1, dec!(-0.30), dec!(1.00), TransactionKind::Purchase);
        assert_eq!(tx.new_balance, dec!(0.70));
        assert!(tx.is_debit());

        let tx = BalanceTransaction::new(1, dec!(25.00), dec!(0.70), TransactionKind::Payment);
        assert_eq!(tx.new_balance, dec!(25.70));
        assert!(tx.is_credit());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(UserRole::from_str("ADMIN"), Some(UserRole::Admin));
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Operator.is_admin());
    }
}
