//! Number request model
//!
//! A number request is one rental of a disposable phone number with a bounded
//! lifetime. Status moves forward only:
//!
//! ```text
//! ready ---> close ---> used | reject
//!   |          |
//!   +----------+------> expired   (time-triggered, ready/close only)
//! ```
//!
//! `used` and `expired` are terminal.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for the verification SMS
    #[default]
    Ready,
    /// An SMS code has been delivered
    Close,
    /// Caller rejected the number
    Reject,
    /// Caller completed the verification
    Used,
    /// Rental window elapsed without completion
    Expired,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Ready => write!(f, "ready"),
            RequestStatus::Close => write!(f, "close"),
            RequestStatus::Reject => write!(f, "reject"),
            RequestStatus::Used => write!(f, "used"),
            RequestStatus::Expired => write!(f, "expired"),
        }
    }
}

impl RequestStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ready" => Some(RequestStatus::Ready),
            "close" => Some(RequestStatus::Close),
            "reject" => Some(RequestStatus::Reject),
            "used" => Some(RequestStatus::Used),
            "expired" => Some(RequestStatus::Expired),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Used | RequestStatus::Expired)
    }

    /// States the expiry sweep applies to
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Ready | RequestStatus::Close)
    }

    /// Check whether the state machine permits `self -> next`
    ///
    /// Transitions are forward-only. Identity transitions on non-terminal
    /// states are permitted as no-ops. Only open requests may expire.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;

        match (self, next) {
            (Used | Expired, _) => false,
            (Ready, _) => true,
            (Close, Ready) => false,
            (Close, _) => true,
            (Reject, Reject | Used) => true,
            (Reject, _) => false,
        }
    }
}

/// One received SMS, append-only history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Raw message body
    pub message: String,

    /// When the message arrived
    pub received_at: DateTime<Utc>,
}

/// Number request entity
///
/// `expires_at` is fixed at creation and never changes; the cost charged is
/// final once the request reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberRequest {
    /// Opaque public identifier (32 hex chars)
    pub request_id: String,

    /// Owning user
    pub user_id: i32,

    /// Country the number belongs to
    pub country_id: i32,

    /// Application the verification targets
    pub application_id: i32,

    /// Assigned number in `+<phone_code><digits>` form
    pub phone_number: String,

    /// Current lifecycle status
    pub status: RequestStatus,

    /// Cost charged at creation
    pub cost: Decimal,

    /// Currency code (ISO 4217)
    pub currency: String,

    /// Extracted verification code, once delivered
    pub sms_code: Option<String>,

    /// Hard deadline, immutable after creation
    pub expires_at: DateTime<Utc>,

    /// When the first SMS arrived
    pub received_at: Option<DateTime<Utc>>,

    /// When the caller marked the request used
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl NumberRequest {
    /// Create a new request in the `ready` state
    pub fn new(
        user_id: i32,
        country_id: i32,
        application_id: i32,
        phone_number: String,
        cost: Decimal,
        currency: String,
        ttl_minutes: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            request_id: Uuid::new_v4().simple().to_string(),
            user_id,
            country_id,
            application_id,
            phone_number,
            status: RequestStatus::Ready,
            cost,
            currency,
            sms_code: None,
            expires_at: now + Duration::minutes(ttl_minutes),
            received_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Logical expiry check; the deadline instant itself counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && now >= self.expires_at
    }

    /// Logical expiry check against the current clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> NumberRequest {
        NumberRequest::new(
            1,
            7,
            12,
            "+15550001111".to_string(),
            dec!(0.30),
            "USD".to_string(),
            20,
        )
    }

    #[test]
    fn test_new_request_defaults() {
        let req = request();
        assert_eq!(req.status, RequestStatus::Ready);
        assert_eq!(req.request_id.len(), 32);
        assert!(req.request_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(req.sms_code.is_none());
        assert_eq!(req.expires_at - req.created_at, Duration::minutes(20));
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for terminal in [RequestStatus::Used, RequestStatus::Expired] {
            for next in [
                RequestStatus::Ready,
                RequestStatus::Close,
                RequestStatus::Reject,
                RequestStatus::Used,
                RequestStatus::Expired,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} must be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_forward_only_transitions() {
        use RequestStatus::*;

        assert!(Ready.can_transition_to(Close));
        assert!(Ready.can_transition_to(Reject));
        assert!(Ready.can_transition_to(Used));
        assert!(Ready.can_transition_to(Expired));
        assert!(Ready.can_transition_to(Ready));

        assert!(Close.can_transition_to(Used));
        assert!(Close.can_transition_to(Reject));
        assert!(Close.can_transition_to(Expired));
        assert!(!Close.can_transition_to(Ready));

        assert!(Reject.can_transition_to(Used));
        assert!(!Reject.can_transition_to(Ready));
        assert!(!Reject.can_transition_to(Close));
        assert!(!Reject.can_transition_to(Expired));
    }

    #[test]
    fn test_expiry_boundary() {
        let req = request();
        assert!(!req.is_expired_at(req.expires_at - Duration::seconds(1)));
        // Expiry wins the tie at the exact deadline
        assert!(req.is_expired_at(req.expires_at));
        assert!(req.is_expired_at(req.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_terminal_request_never_logically_expires() {
        let mut req = request();
        req.status = RequestStatus::Used;
        assert!(!req.is_expired_at(req.expires_at + Duration::hours(1)));
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["ready", "close", "reject", "used", "expired"] {
            assert_eq!(RequestStatus::from_str(s).unwrap().to_string(), s);
        }
        assert_eq!(RequestStatus::from_str("banana"), None);
    }
}
