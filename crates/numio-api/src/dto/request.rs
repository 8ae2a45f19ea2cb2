//! Admin request DTOs

use chrono::{DateTime, Utc};
use numio_core::models::{NumberRequest, SmsMessage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// POST /admin/requests/{request_id}/sms request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliverSmsRequest {
    /// Raw SMS body as received from the carrier
    #[validate(length(min = 1, max = 1024))]
    pub message: String,
}

/// One SMS history entry
#[derive(Debug, Clone, Serialize)]
pub struct SmsHistoryItem {
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl From<SmsMessage> for SmsHistoryItem {
    fn from(sms: SmsMessage) -> Self {
        Self {
            message: sms.message,
            received_at: sms.received_at,
        }
    }
}

/// Full request view for admins
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetailResponse {
    pub request_id: String,
    pub user_id: i32,
    pub country_id: i32,
    pub application_id: i32,
    pub phone_number: String,
    pub status: String,
    pub cost: Decimal,
    pub currency: String,
    pub sms_code: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub sms_history: Vec<SmsHistoryItem>,
}

impl RequestDetailResponse {
    /// Combine a request and its history
    pub fn new(request: NumberRequest, history: Vec<SmsMessage>) -> Self {
        Self {
            request_id: request.request_id,
            user_id: request.user_id,
            country_id: request.country_id,
            application_id: request.application_id,
            phone_number: request.phone_number,
            status: request.status.to_string(),
            cost: request.cost,
            currency: request.currency,
            sms_code: request.sms_code,
            expires_at: request.expires_at,
            received_at: request.received_at,
            completed_at: request.completed_at,
            created_at: request.created_at,
            sms_history: history.into_iter().map(Into::into).collect(),
        }
    }
}

/// POST /admin/requests/sweep response
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Number of requests force-expired by this sweep
    pub expired: u64,
}
