//! Control facade DTOs
//!
//! Wire shapes for the public control API. These are compatibility surfaces:
//! field names, string-encoded amounts, and the nested price map match what
//! existing SMS-man-style clients expect, so they must not drift.

use numio_core::models::{Application, Country, NumberRequest, PriceEntry};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// GET /get-balance response
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    /// Balance rendered with exactly two decimal places
    pub balance: String,
}

impl BalanceResponse {
    /// Build from a raw balance, rounded half-up to two decimal places
    pub fn new(balance: Decimal) -> Self {
        let rounded = balance.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            balance: format!("{:.2}", rounded),
        }
    }
}

/// Query parameters naming a (country, application) pair
#[derive(Debug, Clone, Deserialize)]
pub struct PairQuery {
    pub country_id: i32,
    pub application_id: i32,
}

/// One entry of the GET /limits response array
#[derive(Debug, Clone, Serialize)]
pub struct LimitEntry {
    pub application_id: i32,
    pub country_id: i32,
    /// Numbers currently available; 0 when the pair is not offered
    pub numbers: i64,
}

/// GET /get-number response
#[derive(Debug, Clone, Serialize)]
pub struct NumberResponse {
    pub request_id: String,
    pub country_id: i32,
    pub application_id: i32,
    pub number: String,
}

impl From<&NumberRequest> for NumberResponse {
    fn from(request: &NumberRequest) -> Self {
        Self {
            request_id: request.request_id.clone(),
            country_id: request.country_id,
            application_id: request.application_id,
            number: request.phone_number.clone(),
        }
    }
}

/// Query parameters naming a request
#[derive(Debug, Clone, Deserialize)]
pub struct RequestQuery {
    pub request_id: String,
}

/// GET /get-sms response
#[derive(Debug, Clone, Serialize)]
pub struct SmsResponse {
    pub request_id: String,
    pub country_id: i32,
    pub application_id: i32,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_code: Option<String>,
}

impl From<&NumberRequest> for SmsResponse {
    fn from(request: &NumberRequest) -> Self {
        Self {
            request_id: request.request_id.clone(),
            country_id: request.country_id,
            application_id: request.application_id,
            number: request.phone_number.clone(),
            sms_code: request.sms_code.clone(),
        }
    }
}

/// POST /set-status query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusQuery {
    pub request_id: String,
    pub status: String,
}

/// POST /set-status response
#[derive(Debug, Clone, Serialize)]
pub struct SetStatusResponse {
    pub request_id: String,
    pub success: bool,
}

/// Query parameters naming a country
#[derive(Debug, Clone, Deserialize)]
pub struct CountryQuery {
    pub country_id: i32,
}

/// One cell of the nested GET /get-prices map
#[derive(Debug, Clone, Serialize)]
pub struct PriceCell {
    /// Base cost as a decimal string
    pub cost: String,
    /// Coarse availability count
    pub count: i64,
}

/// Nested price map: country id -> application id -> price cell
pub type PriceMap = BTreeMap<String, BTreeMap<String, PriceCell>>;

/// Build the nested price map from active entries
pub fn price_map(entries: &[PriceEntry]) -> PriceMap {
    let mut map = PriceMap::new();
    for entry in entries {
        map.entry(entry.country_id.to_string())
            .or_default()
            .insert(
                entry.application_id.to_string(),
                PriceCell {
                    cost: entry.cost.to_string(),
                    count: entry.count,
                },
            );
    }
    map
}

/// One entry of the GET /countries response
#[derive(Debug, Clone, Serialize)]
pub struct CountryItem {
    pub id: i32,
    pub title: String,
}

impl From<&Country> for CountryItem {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id,
            title: country.title.clone(),
        }
    }
}

/// One entry of the GET /applications response
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationItem {
    pub id: i32,
    pub name: String,
    pub code: String,
}

impl From<&Application> for ApplicationItem {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            name: app.name.clone(),
            code: app.code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_renders_two_decimals() {
        assert_eq!(BalanceResponse::new(dec!(25)).balance, "25.00");
        assert_eq!(BalanceResponse::new(dec!(0.3)).balance, "0.30");
        assert_eq!(BalanceResponse::new(dec!(1.005)).balance, "1.01");
    }

    #[test]
    fn test_price_map_shape() {
        let entries = vec![
            PriceEntry {
                country_id: 7,
                application_id: 12,
                cost: dec!(0.30),
                count: 100,
                ..Default::default()
            },
            PriceEntry {
                country_id: 7,
                application_id: 15,
                cost: dec!(0.45),
                count: 50,
                ..Default::default()
            },
        ];

        let map = price_map(&entries);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["7"]["12"]["cost"], "0.30");
        assert_eq!(json["7"]["12"]["count"], 100);
        assert_eq!(json["7"]["15"]["cost"], "0.45");
    }

    #[test]
    fn test_sms_code_omitted_when_pending() {
        let request = NumberRequest::new(
            1,
            7,
            12,
            "+15550001111".to_string(),
            dec!(0.30),
            "USD".to_string(),
            20,
        );
        let json = serde_json::to_value(SmsResponse::from(&request)).unwrap();
        assert!(json.get("sms_code").is_none());
    }
}
