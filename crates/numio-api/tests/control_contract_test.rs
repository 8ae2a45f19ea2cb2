//! Contract tests for the control facade DTOs
//!
//! The facade wire format is what existing clients integrate against; these
//! tests pin the exact field names and encodings.

#[cfg(test)]
mod tests {
    use numio_api::dto::control::{
        price_map, ApplicationItem, BalanceResponse, CountryItem, LimitEntry, NumberResponse,
        SetStatusResponse, SmsResponse,
    };
    use numio_core::models::{Application, Country, NumberRequest, PriceEntry};
    use rust_decimal_macros::dec;

    fn sample_request() -> NumberRequest {
        NumberRequest::new(
            42,
            7,
            12,
            "+15550001111".to_string(),
            dec!(0.30),
            "USD".to_string(),
            20,
        )
    }

    #[test]
    fn test_balance_is_a_two_decimal_string() {
        let json = serde_json::to_value(BalanceResponse::new(dec!(25))).unwrap();
        assert_eq!(json, serde_json::json!({ "balance": "25.00" }));

        let json = serde_json::to_value(BalanceResponse::new(dec!(0.305))).unwrap();
        assert_eq!(json["balance"], "0.31");
    }

    #[test]
    fn test_number_response_fields() {
        let request = sample_request();
        let json = serde_json::to_value(NumberResponse::from(&request)).unwrap();

        assert_eq!(json["request_id"], request.request_id);
        assert_eq!(json["country_id"], 7);
        assert_eq!(json["application_id"], 12);
        assert_eq!(json["number"], "+15550001111");
        // The facade never exposes cost or expiry on this endpoint
        assert!(json.get("cost").is_none());
        assert!(json.get("expires_at").is_none());
    }

    #[test]
    fn test_request_id_is_simple_uuid() {
        let request = sample_request();
        assert_eq!(request.request_id.len(), 32);
        assert!(request
            .request_id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sms_response_with_and_without_code() {
        let mut request = sample_request();

        let json = serde_json::to_value(SmsResponse::from(&request)).unwrap();
        assert!(json.get("sms_code").is_none());

        request.sms_code = Some("4821".to_string());
        let json = serde_json::to_value(SmsResponse::from(&request)).unwrap();
        assert_eq!(json["sms_code"], "4821");
        assert_eq!(json["number"], "+15550001111");
    }

    #[test]
    fn test_set_status_response_shape() {
        let response = SetStatusResponse {
            request_id: "abc123".to_string(),
            success: true,
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json, serde_json::json!({ "request_id": "abc123", "success": true }));
    }

    #[test]
    fn test_limits_entry_shape() {
        let json = serde_json::to_value(vec![LimitEntry {
            application_id: 12,
            country_id: 7,
            numbers: 0,
        }])
        .unwrap();
        assert_eq!(json[0]["numbers"], 0);
        assert_eq!(json[0]["country_id"], 7);
    }

    #[test]
    fn test_price_map_is_keyed_by_string_ids() {
        let entries = vec![PriceEntry {
            country_id: 7,
            application_id: 12,
            cost: dec!(0.30),
            count: 250,
            ..Default::default()
        }];

        let json = serde_json::to_value(price_map(&entries)).unwrap();
        assert_eq!(json["7"]["12"]["cost"], "0.30");
        assert_eq!(json["7"]["12"]["count"], 250);
    }

    #[test]
    fn test_catalog_items() {
        let country = Country {
            id: 7,
            title: "United States".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(CountryItem::from(&country)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "title": "United States" }));

        let app = Application {
            id: 12,
            name: "Telegram".to_string(),
            code: "tg".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(ApplicationItem::from(&app)).unwrap();
        assert_eq!(json["code"], "tg");
    }
}
